//! Audio and video embeds.

use crate::config::UrlConfig;
use crate::document::{Audio, Video};
use maud::{Markup, PreEscaped, html};

/// Audio player button plus label. Both show the rendered label.
pub fn render_audio(audio: &Audio, urls: &UrlConfig) -> Markup {
    let href = format!("{}{}", urls.audio_base, audio.path);
    let label = PreEscaped(audio.label.as_str());
    html! {
        div.inline-audio {
            a.sm2_button href=(href) { (label) }
            p.label { (label) }
        }
    }
}

pub fn render_video(video: &Video, urls: &UrlConfig) -> Markup {
    let src = format!("{}{}?rel=0&showinfo=0", urls.video_embed_base, video.id);
    html! {
        div.inline-video {
            iframe width=(video.width) height=(video.height) src=(src) frameborder="0" allowfullscreen {}
            @if !video.caption.is_empty() {
                p.caption { (PreEscaped(&video.caption)) }
            }
        }
    }
}
