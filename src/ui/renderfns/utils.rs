/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Short text stand-in for an avatar: `[image]` for embedded data, the host
/// for links, `-` when there is none.
pub fn avatar_label(avatar: &str) -> String {
  let avatar = avatar.trim();
  if avatar.is_empty() {
    return "-".to_string();
  }
  if avatar.starts_with("data:") {
    return "[image]".to_string();
  }
  match url::Url::parse(avatar) {
    Ok(url) => url.host_str().unwrap_or("[image]").to_string(),
    Err(_) => truncate(avatar, 16),
  }
}
