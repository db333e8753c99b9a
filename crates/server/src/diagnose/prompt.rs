//! Prompt text sent to the generation service.

use std::sync::LazyLock;

use instadiag_client::{Post, PostKind, ProfileMatch, ProfileRecord};
use instadiag_core::Mode;
use regex::Regex;

/// Posts included per profile.
const MAX_POSTS: usize = 5;

/// Caption characters kept before truncation.
const MAX_CAPTION_CHARS: usize = 100;

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"));

/// Render `n` with `,` thousands separators.
pub fn format_count(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn hashtag_count(text: &str) -> usize {
    HASHTAG.find_iter(text).count()
}

fn truncate_caption(caption: &str) -> String {
    if caption.chars().count() > MAX_CAPTION_CHARS {
        let head: String = caption.chars().take(MAX_CAPTION_CHARS).collect();
        format!("{head}...")
    } else {
        caption.to_string()
    }
}

fn kind_label(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Reel => "Reel",
        PostKind::Carousel => "Carousel",
        PostKind::Feed => "Feed post",
    }
}

/// Profile fields, one per line; absent fields are omitted.
fn profile_lines(record: &ProfileRecord, fallback_username: &str) -> Vec<String> {
    let username = record
        .username
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(fallback_username);

    let mut lines = vec![format!("Username: {username}")];
    if let Some(name) = record.full_name.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("Display name: {name}"));
    }
    if let Some(bio) = record.biography.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("Bio: {bio}"));
    }
    if let Some(n) = record.followers_count {
        lines.push(format!("Followers: {}", format_count(n)));
    }
    if let Some(n) = record.follows_count {
        lines.push(format!("Following: {}", format_count(n)));
    }
    lines
}

fn post_line(index: usize, post: &Post) -> String {
    let caption = post.caption_text();
    let mut line = format!(
        "Post {} [{}]: likes {}, comments {}, hashtags {}",
        index + 1,
        kind_label(post.kind()),
        format_count(post.likes()),
        format_count(post.comments()),
        hashtag_count(caption),
    );
    if let Some(views) = post.views() {
        line.push_str(&format!(", views {}", format_count(views)));
    }
    line.push_str(&format!(" \"{}\"", truncate_caption(caption)));
    line
}

/// Composite context block for the matched profiles.
pub fn build_context(profiles: &ProfileMatch, username: &str, competitor: Option<&str>) -> String {
    let mut sections = vec![format!("[Profile]\n{}", profile_lines(&profiles.target, username).join("\n"))];

    let posts = profiles.target.posts();
    if !posts.is_empty() {
        let lines: Vec<String> = posts.iter().take(MAX_POSTS).enumerate().map(|(i, p)| post_line(i, p)).collect();
        sections.push(format!("[Recent posts]\n{}", lines.join("\n")));
    }

    if let (Some(record), Some(handle)) = (&profiles.competitor, competitor) {
        sections.push(format!("[Competitor account]\n{}", profile_lines(record, handle).join("\n")));
    }

    sections.join("\n\n")
}

/// Instruction for the generation service.
pub fn query_text(mode: Mode, with_competitor: bool) -> String {
    let mut query = String::from("Please diagnose this Instagram account.");
    query.push_str(match mode {
        Mode::Mild => " Be gentle.",
        Mode::Medium => " Give a balanced diagnosis.",
        Mode::Spicy => " Do not hold back.",
    });
    if with_competitor {
        query.push_str(" Data for a competitor account is also provided, so include a comparative analysis.");
    }
    query
}
