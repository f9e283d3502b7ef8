//! Small utility helpers used across modules.

/// Render remaining seconds as "MM:SS" for the countdown display.
/// Fractional seconds round up so the display never shows 00:00 while time
/// remains; negative inputs clamp to zero.
pub fn format_time(seconds: f64) -> String {
  let whole = seconds.max(0.0).ceil() as u64;
  format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge payloads.
#[allow(dead_code)]
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}
