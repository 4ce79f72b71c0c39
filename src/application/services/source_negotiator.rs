//! Format and responsive source negotiation.

use crate::application::dto::{
    ImageProps, ImgAttributes, Loading, PictureSource, RenderPlan, RenderStyle, SrcsetCandidate,
    ViewContext,
};
use crate::domain::entities::{Encoding, ImageSourceSet, LoadPhase, LoadState, Tier};

/// `sizes` for detail, modal and full views.
pub const WIDE_SIZES: &str = "(max-width: 768px) 100vw, (max-width: 1280px) 90vw, 1280px";

/// `sizes` for grid and thumbnail views.
pub const NARROW_SIZES: &str = "(max-width: 640px) 50vw, (max-width: 1024px) 33vw, 25vw";

/// `sizes` hint for a context.
#[must_use]
pub const fn sizes_for(context: ViewContext) -> &'static str {
    if context.is_wide() {
        WIDE_SIZES
    } else {
        NARROW_SIZES
    }
}

/// Srcset candidates of one encoding across all tiers.
///
/// Absent tiers are skipped, and so is any tier whose URL repeats the
/// previous candidate, so identical bytes are never listed under two widths.
#[must_use]
pub fn srcset_candidates(sources: &ImageSourceSet, encoding: Encoding) -> Vec<SrcsetCandidate> {
    let mut candidates: Vec<SrcsetCandidate> = Vec::with_capacity(Tier::ALL.len());
    for tier in Tier::ALL {
        let Some(url) = sources.url(tier, encoding) else {
            continue;
        };
        if candidates.last().is_some_and(|prev| prev.url == url) {
            continue;
        }
        candidates.push(SrcsetCandidate {
            url: url.to_string(),
            width: tier.nominal_width(),
        });
    }
    candidates
}

/// `<source>` list for a source set; empty for animated images.
#[must_use]
pub fn negotiate(sources: &ImageSourceSet, context: ViewContext) -> Vec<PictureSource> {
    if sources.animated {
        return Vec::new();
    }
    Encoding::PREFERENCE
        .into_iter()
        .filter_map(|encoding| {
            let srcset = srcset_candidates(sources, encoding);
            (!srcset.is_empty()).then(|| PictureSource {
                mime_type: encoding.mime_type(),
                srcset,
                sizes: sizes_for(context),
            })
        })
        .collect()
}

/// Combines props and state into what the render layer draws.
#[must_use]
pub fn build_render_plan(props: &ImageProps, state: &LoadState) -> RenderPlan {
    let img = ImgAttributes {
        src: state.current_src().to_string(),
        alt: props.alt.clone(),
        loading: if props.eager {
            Loading::Eager
        } else {
            Loading::Lazy
        },
        fetch_priority: props.fetch_priority,
    };

    let reached_target = matches!(state.phase(), LoadPhase::CachedReady | LoadPhase::Upgraded);
    let sources = if reached_target && !state.is_error() {
        negotiate(&props.sources, props.context)
    } else {
        Vec::new()
    };

    RenderPlan {
        sources,
        img,
        style: RenderStyle {
            blurred: !state.is_loaded(),
            fade_in: state.is_loaded() && !state.skip_transition(),
            broken: state.is_error(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_set() -> ImageSourceSet {
        ImageSourceSet::new("o.jpg")
            .with_tier(Tier::Thumbnail, "t.jpg")
            .with_tier(Tier::Small, "s.jpg")
            .with_tier(Tier::Regular, "r.jpg")
            .with_avif(Tier::Small, "s.avif")
            .with_avif(Tier::Original, "o.avif")
    }

    fn urls(candidates: &[SrcsetCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.url.as_str()).collect()
    }

    #[test]
    fn test_candidates_use_fixed_widths() {
        let candidates = srcset_candidates(&full_set(), Encoding::Universal);
        let widths: Vec<u32> = candidates.iter().map(|c| c.width).collect();
        assert_eq!(widths, vec![200, 800, 1080, 1920]);
    }

    #[test]
    fn test_duplicate_tier_url_is_skipped() {
        let set = ImageSourceSet::new("o.jpg")
            .with_tier(Tier::Thumbnail, "same.jpg")
            .with_tier(Tier::Small, "same.jpg")
            .with_tier(Tier::Regular, "r.jpg");

        let candidates = srcset_candidates(&set, Encoding::Universal);

        assert_eq!(urls(&candidates), vec!["same.jpg", "r.jpg", "o.jpg"]);
        assert_eq!(candidates[0].width, 200);
    }

    #[test]
    fn test_absent_tiers_are_skipped() {
        let candidates = srcset_candidates(&full_set(), Encoding::Avif);
        assert_eq!(urls(&candidates), vec!["s.avif", "o.avif"]);
        assert_eq!(candidates[1].width, 1920);
    }

    #[test]
    fn test_preferred_encoding_first() {
        let sources = negotiate(&full_set(), ViewContext::Grid);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].mime_type, Some("image/avif"));
        assert_eq!(sources[1].mime_type, None);
        assert_eq!(sources[0].srcset_attr(), "s.avif 800w, o.avif 1920w");
    }

    #[test]
    fn test_encoding_without_urls_is_omitted() {
        let set = ImageSourceSet::new("o.jpg").with_tier(Tier::Small, "s.jpg");
        let sources = negotiate(&set, ViewContext::Grid);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].mime_type, None);
    }

    #[test]
    fn test_sizes_follow_context() {
        assert_eq!(sizes_for(ViewContext::Modal), WIDE_SIZES);
        assert_eq!(sizes_for(ViewContext::Detail), WIDE_SIZES);
        assert_eq!(sizes_for(ViewContext::Grid), NARROW_SIZES);
        assert_eq!(sizes_for(ViewContext::Thumbnail), NARROW_SIZES);
    }

    #[test]
    fn test_animated_bypasses_negotiation() {
        let set = full_set().animated();
        assert!(negotiate(&set, ViewContext::Full).is_empty());
    }

    #[test]
    fn test_plan_for_placeholder_is_blurred_plain_img() {
        let props = ImageProps::new(full_set(), "a photo");
        let mut state = LoadState::seeding("t.jpg");
        state.show_placeholder().unwrap();

        let plan = build_render_plan(&props, &state);

        assert!(!plan.is_picture());
        assert_eq!(plan.img.src, "t.jpg");
        assert_eq!(plan.img.loading, Loading::Lazy);
        assert!(plan.style.blurred);
        assert!(!plan.style.fade_in);
    }

    #[test]
    fn test_plan_for_cached_ready_skips_fade() {
        let props = ImageProps::new(full_set(), "a photo")
            .eager(true)
            .with_context(ViewContext::Modal);
        let mut state = LoadState::seeding("t.jpg");
        state.seed_cached("s.jpg").unwrap();

        let plan = build_render_plan(&props, &state);

        assert!(plan.is_picture());
        assert_eq!(plan.sources[0].sizes, WIDE_SIZES);
        assert_eq!(plan.img.src, "s.jpg");
        assert_eq!(plan.img.loading, Loading::Eager);
        assert!(!plan.style.fade_in);
        assert!(!plan.style.blurred);
    }

    #[test]
    fn test_plan_for_failure_shows_broken_plain_img() {
        let props = ImageProps::new(full_set(), "a photo");
        let mut state = LoadState::seeding("t.jpg");
        state.show_placeholder().unwrap();
        state.begin_probe().unwrap();
        state.fail().unwrap();

        let plan = build_render_plan(&props, &state);

        assert!(!plan.is_picture());
        assert!(plan.style.broken);
        assert_eq!(plan.img.src, "t.jpg");
    }
}
