//! Filling the fanlink HTML template for one release.
//!
//! The template is a complete page with a `<script>` block defining
//! `songConfig`. That block is replaced wholesale, the `<title>` is rewritten
//! and gets a description meta tag, and a legacy Font Awesome include is
//! dropped.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

use crate::error::FanlinkError;
use crate::models::{Release, ResolvedIdentity};

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// First `<script>` block through the `</script>` that follows `const songConfig`.
static SONG_CONFIG_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<script>.*?const songConfig.*?</script>").unwrap());

/// Single-line `<title>` element.
static TITLE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<title>.*?</title>").unwrap());

/// Font Awesome 4.7 include left over in older templates.
static FONT_AWESOME_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<!-- Font Awesome -->\s*<link href="https://cdn\.jsdelivr\.net/npm/font-awesome@4\.7\.0/css/font-awesome\.min\.css" rel="stylesheet">"#,
    )
    .unwrap()
});

/// Relative cover path from `{output}/{label}/{number}/index.html`.
const COVER_PREFIX: &str = "../../cover/";

/// Value used for platforms without a link.
const MISSING_LINK: &str = "#";

/// Platform keys in `songConfig.platformLinks`, with the catalog keys that feed each.
const PLATFORMS: &[(&str, &[&str])] = &[
    ("qqmusic", &["qqmusic", "qq"]),
    ("spotify", &["spotify"]),
    ("netease", &["netease"]),
    ("applemusic", &["applemusic", "apple"]),
    ("soundcloud", &["soundcloud"]),
];

// ============================================================================
// ESCAPING
// ============================================================================

/// Escape for a double-quoted JavaScript string inside an HTML `<script>`.
pub fn escape_js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

// ============================================================================
// RENDERING
// ============================================================================

/// Relative URL of a release's cover image, or empty when it has none.
pub fn cover_url(release: &Release) -> String {
    match release.cover_name() {
        Some(name) => format!("{}{}", COVER_PREFIX, urlencoding::encode(name)),
        None => String::new(),
    }
}

/// The `<script>` block carrying the song configuration.
pub fn song_config_script(release: &Release, identity: &ResolvedIdentity) -> String {
    let mut links = String::new();
    for (i, (platform, keys)) in PLATFORMS.iter().enumerate() {
        let link = release.links.first_of(keys).unwrap_or(MISSING_LINK);
        let comma = if i + 1 < PLATFORMS.len() { "," } else { "" };
        links.push_str(&format!(
            "        {}: \"{}\"{}\n",
            platform,
            escape_js_string(link),
            comma
        ));
    }

    format!(
        r#"  <script>
    const songConfig = {{
      songName: "{title}",
      artistName: "{artist}",
      songSlug: "{number}",
      coverImage: "{cover}",
      platformLinks: {{
{links}      }}
    }};
  </script>"#,
        title = escape_js_string(&release.song_title),
        artist = escape_js_string(&release.artist),
        number = identity.song_number,
        cover = escape_js_string(&cover_url(release)),
        links = links,
    )
}

/// Fill `template` for one resolved release.
///
/// Fails only when the template has no `songConfig` script block; a missing
/// `<title>` or Font Awesome include is left alone.
pub fn render_page(
    template: &str,
    release: &Release,
    identity: &ResolvedIdentity,
) -> Result<String, FanlinkError> {
    validate_template(template)?;

    let script = song_config_script(release, identity);
    let content = SONG_CONFIG_SCRIPT.replace(template, NoExpand(&script));

    let heading = format!(
        "{} - {}",
        escape_html(&release.artist),
        escape_html(&release.song_title)
    );
    let title = format!(
        "<title>{heading}</title>\n  <meta name=\"description\" content=\"{heading} 音乐聚合页\">",
        heading = heading
    );
    let content = TITLE_TAG.replace(&content, NoExpand(&title));

    let content = FONT_AWESOME_LINK.replace(&content, "");
    Ok(content.into_owned())
}

/// Check a template once up front, before any page is written.
pub fn validate_template(template: &str) -> Result<(), FanlinkError> {
    if SONG_CONFIG_SCRIPT.is_match(template) {
        Ok(())
    } else {
        Err(FanlinkError::MissingSongConfig)
    }
}
