//! HTML rendering of a [`RenderPlan`].

use maud::{Markup, html};

use crate::application::dto::{FetchPriority, PictureSource, RenderPlan, RenderStyle};

const BASE_CLASS: &str = "progressive-image";

fn class_list(style: RenderStyle) -> String {
    let mut classes = vec![BASE_CLASS];
    if style.blurred {
        classes.push("is-blurred");
    }
    if style.fade_in {
        classes.push("fade-in");
    }
    if style.broken {
        classes.push("is-broken");
    }
    classes.join(" ")
}

fn source_tag(source: &PictureSource) -> Markup {
    html! {
        source type=[source.mime_type] srcset=(source.srcset_attr()) sizes=(source.sizes);
    }
}

fn img_tag(plan: &RenderPlan) -> Markup {
    let img = &plan.img;
    html! {
        img src=(img.src)
            alt=(img.alt)
            loading=(img.loading.as_str())
            decoding="async"
            fetchpriority=[img.fetch_priority.map(FetchPriority::as_str)]
            class=(class_list(plan.style));
    }
}

/// Renders a plan as a `<picture>` with its sources, or a bare `<img>`.
#[must_use]
pub fn render_markup(plan: &RenderPlan) -> String {
    let markup = if plan.is_picture() {
        html! {
            picture {
                @for source in &plan.sources {
                    (source_tag(source))
                }
                (img_tag(plan))
            }
        }
    } else {
        img_tag(plan)
    };
    markup.into_string()
}
