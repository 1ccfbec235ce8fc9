//! Inline image and gallery rendering.
//!
//! Both link a lightbox (`a.fancybox`) to the large variant. Inline images
//! show the medium variant; gallery items show thumbnails and share their
//! gallery's `rel` group so the lightbox can page through them.

use crate::config::UrlConfig;
use crate::document::{Image, ImageGallery, ImagePlacement};
use crate::types::{ArticleContext, ImageSize};
use maud::{Markup, PreEscaped, html};

/// Render an inline image with its optional caption block.
pub fn render_image(image: &Image, ctx: &ArticleContext, urls: &UrlConfig) -> Markup {
    let class = match image.placement {
        ImagePlacement::FloatLeft => "float-image left",
        ImagePlacement::AltVoice => "alternate-voice inline-image",
        ImagePlacement::Inline => "inline-image",
    };
    let large = ctx.image_url(&urls.image_base, &image.template, ImageSize::Large);
    let medium = ctx.image_url(&urls.image_base, &image.template, ImageSize::Medium);
    let has_caption = !image.caption.is_empty();
    let has_credit = !image.credit.is_empty();

    html! {
        div class=(class) {
            a.fancybox href=(large) {
                img src=(medium) alt=(image.alt);
            }
            @if has_caption || has_credit {
                p.caption {
                    @if has_caption {
                        (PreEscaped(&image.caption))
                    }
                    @if has_credit {
                        span.credit { (PreEscaped(&image.credit)) }
                    }
                }
            }
        }
    }
}

/// Render a gallery as a thumbnail list.
///
/// Empty comments between the list items swallow inter-element whitespace,
/// which the gallery's inline-block layout would otherwise show as gaps.
pub fn render_gallery(gallery: &ImageGallery, ctx: &ArticleContext, urls: &UrlConfig) -> Markup {
    html! {
        ul.image-gallery {
            (PreEscaped("<!--"))
            @for image in &gallery.images {
                @let large = ctx.image_url(&urls.image_base, &image.template, ImageSize::Large);
                @let thumb = ctx.image_url(&urls.image_base, &image.template, ImageSize::Thumb);
                @let title = format!(
                    "{}<span class='credit'>{}</span>",
                    image.caption, image.credit
                );
                (PreEscaped("-->"))
                li data-caption=(image.caption) data-credit=(image.credit) {
                    a.fancybox rel=(gallery.group) title=(title) href=(large) {
                        img src=(thumb) width="100" alt=(image.alt);
                    }
                }
                (PreEscaped("<!--"))
            }
            (PreEscaped("-->"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UrlTemplate;

    fn image(caption: &str, credit: &str) -> Image {
        Image {
            template: UrlTemplate::from_url_format("http://host/path/***-name.jpg").unwrap(),
            alt: "A river".into(),
            caption: caption.into(),
            credit: credit.into(),
            placement: ImagePlacement::Inline,
        }
    }

    fn render(img: &Image) -> String {
        render_image(img, &ArticleContext::new("2", "3"), &UrlConfig::default()).into_string()
    }

    #[test]
    fn image_links_large_and_shows_medium() {
        let html = render(&image("", ""));
        assert!(html.contains(r#"href="/images/issues/2/3/large-name.jpg""#));
        assert!(html.contains(r#"src="/images/issues/2/3/medium-name.jpg""#));
        assert!(html.contains(r#"alt="A river""#));
        assert!(html.starts_with(r#"<div class="inline-image">"#));
    }

    #[test]
    fn no_caption_block_without_caption_or_credit() {
        let html = render(&image("", ""));
        assert!(!html.contains("caption"));
        assert!(!html.contains("credit"));
    }

    #[test]
    fn credit_only_caption_block() {
        let html = render(&image("", "Photo: Jane"));
        assert!(html.contains(r#"<p class="caption"><span class="credit">Photo: Jane</span></p>"#));
    }

    #[test]
    fn caption_and_credit() {
        let html = render(&image("<em>Dawn</em>", "Jane"));
        assert!(html.contains(
            r#"<p class="caption"><em>Dawn</em><span class="credit">Jane</span></p>"#
        ));
    }

    #[test]
    fn placement_classes() {
        let mut img = image("", "");
        img.placement = ImagePlacement::FloatLeft;
        assert!(render(&img).starts_with(r#"<div class="float-image left">"#));
        img.placement = ImagePlacement::AltVoice;
        assert!(render(&img).starts_with(r#"<div class="alternate-voice inline-image">"#));
    }

    #[test]
    fn alt_text_is_escaped() {
        let mut img = image("", "");
        img.alt = r#"say "hi" <b>"#.into();
        let html = render(&img);
        assert!(html.contains(r#"alt="say &quot;hi&quot; &lt;b&gt;""#));
    }

    #[test]
    fn rendering_is_idempotent() {
        let img = image("c", "d");
        assert_eq!(render(&img), render(&img));
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    fn gallery() -> ImageGallery {
        ImageGallery {
            group: "river-set".into(),
            images: vec![image("One", "Jane"), image("Two", "")],
        }
    }

    fn render_g(g: &ImageGallery) -> String {
        render_gallery(g, &ArticleContext::new("2", "3"), &UrlConfig::default()).into_string()
    }

    #[test]
    fn gallery_is_comment_delimited_list() {
        let html = render_g(&gallery());
        assert!(html.starts_with(r#"<ul class="image-gallery"><!----><li"#));
        assert!(html.ends_with("</li><!----></ul>"));
        assert_eq!(html.matches("<li ").count(), 2);
    }

    #[test]
    fn gallery_items_share_group() {
        let html = render_g(&gallery());
        assert_eq!(html.matches(r#"rel="river-set""#).count(), 2);
    }

    #[test]
    fn gallery_uses_thumbnails_and_large_links() {
        let html = render_g(&gallery());
        assert!(html.contains(r#"src="/images/issues/2/3/thumb-name.jpg""#));
        assert!(html.contains(r#"href="/images/issues/2/3/large-name.jpg""#));
        assert!(html.contains(r#"width="100""#));
    }

    #[test]
    fn gallery_data_attributes_and_title() {
        let html = render_g(&gallery());
        assert!(html.contains(r#"data-caption="One" data-credit="Jane""#));
        assert!(html.contains(
            r#"title="One&lt;span class='credit'&gt;Jane&lt;/span&gt;""#
        ));
    }

    #[test]
    fn empty_gallery_is_still_well_formed() {
        let g = ImageGallery {
            group: "g".into(),
            images: vec![],
        };
        assert_eq!(render_g(&g), r#"<ul class="image-gallery"><!----></ul>"#);
    }
}
