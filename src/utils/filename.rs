//! Filename construction for archived videos
//!
//! Destination names are built either from a user template or from the
//! default "Title - Channel (MM-YYYY)" pretty format, always sanitized for
//! the filesystem and suffixed with a short id to stay collision-free.

use crate::source::VideoMeta;

/// Longest sanitized name component we will emit.
const MAX_NAME_LEN: usize = 180;

/// Characters that are unsafe in filenames across the platforms we target.
const UNSAFE_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Strip unsafe characters, collapse whitespace, and trim to a sane length.
pub fn sanitize_for_filesystem(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !UNSAFE_CHARS.contains(c))
        .collect();

    let mut collapsed = String::with_capacity(stripped.len());
    let mut last_was_space = true;
    for c in stripped.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
            }
            last_was_space = true;
        } else {
            collapsed.push(c);
            last_was_space = false;
        }
    }
    let collapsed = collapsed.trim_end();

    let truncated: String = collapsed.chars().take(MAX_NAME_LEN).collect();
    truncated.trim_end().to_string()
}

/// Human-facing name for a video: `"Title - Channel (MM-YYYY)"` when the
/// upload date is a valid 8-digit stamp, `"Title - Channel"` otherwise.
pub fn display_name(title: &str, channel: &str, upload_date: &str) -> String {
    let title = sanitize_for_filesystem(title);
    let channel = sanitize_for_filesystem(channel);

    if upload_date.len() == 8 && upload_date.bytes().all(|b| b.is_ascii_digit()) {
        let month = &upload_date[4..6];
        let year = &upload_date[0..4];
        format!("{} - {} ({}-{})", title, channel, month, year)
    } else {
        format!("{} - {}", title, channel)
    }
}

/// Build the destination filename for a finished item.
///
/// A template may use `{title}`, `{uploader}`, `{upload_date}`, and `{ext}`.
/// Without a template the pretty display name plus an 8-char id suffix is
/// used, which keeps media-server listings clean while avoiding collisions.
pub fn destination_filename(
    template: Option<&str>,
    meta: &VideoMeta,
    video_id: &str,
    ext: &str,
) -> String {
    if let Some(template) = template {
        return template
            .replace("{title}", &sanitize_for_filesystem(&meta.title))
            .replace("{uploader}", &sanitize_for_filesystem(&meta.channel))
            .replace("{upload_date}", &meta.upload_date)
            .replace("{ext}", ext);
    }

    let pretty = display_name(&meta.title, &meta.channel, &meta.upload_date);
    let id_prefix: String = video_id.chars().take(8).collect();
    format!("{}_{}.{}", pretty, id_prefix, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(title: &str, channel: &str, upload_date: &str) -> VideoMeta {
        VideoMeta {
            title: title.to_string(),
            channel: channel.to_string(),
            upload_date: upload_date.to_string(),
            description: String::new(),
            tags: Vec::new(),
            url: "https://www.youtube.com/watch?v=x".to_string(),
            thumbnail_url: None,
        }
    }

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_for_filesystem("a/b:c*d?e\"f<g>h|i\\j"), "abcdefghij");
    }

    #[test]
    fn sanitize_collapses_whitespace() {
        assert_eq!(sanitize_for_filesystem("  too   many\tspaces  "), "too many spaces");
    }

    #[test]
    fn sanitize_trims_long_names() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_for_filesystem(&long).len(), 180);
    }

    #[test]
    fn display_name_includes_month_and_year() {
        assert_eq!(display_name("Foo", "Bar", "20230115"), "Foo - Bar (01-2023)");
    }

    #[test]
    fn display_name_omits_invalid_dates() {
        assert_eq!(display_name("Foo", "Bar", ""), "Foo - Bar");
        assert_eq!(display_name("Foo", "Bar", "2023011"), "Foo - Bar");
        assert_eq!(display_name("Foo", "Bar", "2023-01-15"), "Foo - Bar");
    }

    #[test]
    fn template_substitutes_all_placeholders() {
        let m = meta("My Video", "Some Channel", "20230115");
        let name = destination_filename(
            Some("{uploader}/{title} [{upload_date}].{ext}"),
            &m,
            "dQw4w9WgXcQ",
            "webm",
        );
        assert_eq!(name, "Some Channel/My Video [20230115].webm");
    }

    #[test]
    fn default_name_uses_pretty_format_with_id_suffix() {
        let m = meta("Foo", "Bar", "20230115");
        let name = destination_filename(None, &m, "dQw4w9WgXcQ", "mp4");
        assert_eq!(name, "Foo - Bar (01-2023)_dQw4w9Wg.mp4");
    }
}
