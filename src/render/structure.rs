//! Headers, dividers and tables.

use crate::document::{DividerWeight, Header, HeaderLevel, Table};
use maud::{Markup, PreEscaped, html};

pub fn render_header(header: &Header) -> Markup {
    let content = PreEscaped(header.content.as_str());
    html! {
        @match header.level {
            HeaderLevel::Major => { h3 { (content) } },
            HeaderLevel::Minor => { h5 { (content) } },
        }
    }
}

pub fn render_divider(weight: DividerWeight) -> Markup {
    html! {
        @match weight {
            DividerWeight::Major => { hr.special; },
            DividerWeight::Minor => { hr; },
        }
    }
}

/// Render a table. The first row becomes header cells; the leading cell of
/// every row is marked `special`. Cell text is escaped, never Markdown.
pub fn render_table(table: &Table) -> Markup {
    html! {
        table {
            caption { (table.title) }
            tbody {
                @for (row_index, row) in table.rows.iter().enumerate() {
                    tr {
                        @for (cell_index, cell) in row.iter().enumerate() {
                            @let class = (cell_index == 0).then_some("special");
                            @if row_index == 0 {
                                th class=[class] { (cell) }
                            } @else {
                                td class=[class] { (cell) }
                            }
                        }
                    }
                }
            }
        }
    }
}
