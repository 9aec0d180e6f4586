use crate::{
    model::{MediaFormat, ScrapeResult},
    request::Filters,
};

/// Narrows `result.formats` to the entries matching `filters`, then caps the
/// list at `max_formats`. `total_formats` is left as the adapter set it.
///
/// An empty list after filtering is still a successful result.
pub fn apply_filters(mut result: ScrapeResult, filters: &Filters, max_formats: usize) -> ScrapeResult {
    result.formats.retain(|format| matches_filters(format, filters));
    result.formats.truncate(max_formats);
    result.filters_applied = filters.clone();
    result
}

fn matches_filters(format: &MediaFormat, filters: &Filters) -> bool {
    let ext_matches = filters
        .format
        .as_deref()
        .is_none_or(|wanted| format.ext.to_lowercase() == wanted.to_lowercase());
    let quality_matches = filters
        .quality
        .as_deref()
        .is_none_or(|wanted| format.quality.to_lowercase() == wanted.to_lowercase());

    ext_matches && quality_matches
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn format(id: &str, ext: &str, quality: &str) -> MediaFormat {
        MediaFormat {
            format_id: id.to_string(),
            ext: ext.to_string(),
            quality: quality.to_string(),
            filesize: None,
            url: format!("https://cdn.example/{id}"),
            vcodec: None,
            acodec: None,
            width: None,
            height: None,
            fps: None,
            tbr: None,
        }
    }

    fn result_with(formats: Vec<MediaFormat>) -> ScrapeResult {
        ScrapeResult {
            success: true,
            platform: "youtube".to_string(),
            title: None,
            description: None,
            duration: 0,
            thumbnail: None,
            uploader: None,
            upload_date: None,
            view_count: 0,
            like_count: 0,
            total_formats: formats.len(),
            formats,
            filters_applied: Filters::default(),
            scraped_url: "https://youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
        }
    }

    fn sample() -> ScrapeResult {
        result_with(vec![
            format("18", "mp4", "360p"),
            format("22", "MP4", "720p"),
            format("251", "webm", "medium"),
            format("137", "mp4", "1080p"),
        ])
    }

    fn ids(result: &ScrapeResult) -> Vec<&str> {
        result.formats.iter().map(|f| f.format_id.as_str()).collect()
    }

    #[test]
    fn no_filters_keeps_everything() {
        let filtered = apply_filters(sample(), &Filters::default(), 50);
        assert_eq!(ids(&filtered), ["18", "22", "251", "137"]);
        assert_eq!(filtered.filters_applied, Filters::default());
    }

    #[test]
    fn extension_and_quality_must_both_match() {
        let filtered = apply_filters(sample(), &Filters::new(Some("mp4"), None), 50);
        assert_eq!(ids(&filtered), ["18", "22", "137"]);
        assert_eq!(filtered.total_formats, 4);

        let filtered = apply_filters(sample(), &Filters::new(Some("mp4"), Some("720P")), 50);
        assert_eq!(ids(&filtered), ["22"]);
        assert_eq!(filtered.filters_applied.quality.as_deref(), Some("720p"));
    }

    #[test]
    fn quality_is_an_exact_label_match() {
        let filtered = apply_filters(sample(), &Filters::new(None, Some("1080")), 50);
        assert!(filtered.formats.is_empty());
    }

    #[test]
    fn zero_matches_is_still_success() {
        let filtered = apply_filters(sample(), &Filters::new(Some("mp3"), None), 50);
        assert!(filtered.success);
        assert!(filtered.formats.is_empty());
        assert_eq!(filtered.total_formats, 4);
        assert_eq!(filtered.filters_applied.format.as_deref(), Some("mp3"));
    }

    #[test]
    fn cap_truncates_in_order() {
        let filtered = apply_filters(sample(), &Filters::default(), 2);
        assert_eq!(ids(&filtered), ["18", "22"]);
        assert_eq!(filtered.total_formats, 4);
    }

    fn arb_format() -> impl Strategy<Value = MediaFormat> {
        (
            "[0-9]{1,3}",
            prop::sample::select(vec!["mp4", "MP4", "webm", "m4a", "mp3"]),
            prop::sample::select(vec!["360p", "720p", "720P", "1080p", "medium", "unknown"]),
        )
            .prop_map(|(id, ext, quality)| format(&id, ext, quality))
    }

    fn arb_filters() -> impl Strategy<Value = Filters> {
        (
            prop::option::of(prop::sample::select(vec!["mp4", "webm", "mp3"])),
            prop::option::of(prop::sample::select(vec!["720p", "1080p", "medium"])),
        )
            .prop_map(|(format, quality)| Filters::new(format, quality))
    }

    proptest! {
        #[test]
        fn filtering_is_idempotent(
            formats in prop::collection::vec(arb_format(), 0..30),
            filters in arb_filters(),
            cap in 1usize..60,
        ) {
            let once = apply_filters(result_with(formats), &filters, cap);
            let twice = apply_filters(once.clone(), &filters, cap);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn total_is_pre_filter_count_and_length_is_bounded(
            formats in prop::collection::vec(arb_format(), 0..30),
            filters in arb_filters(),
            cap in 1usize..60,
        ) {
            let total = formats.len();
            let filtered = apply_filters(result_with(formats), &filters, cap);
            prop_assert_eq!(filtered.total_formats, total);
            prop_assert!(filtered.formats.len() <= total.min(cap));
        }
    }
}
