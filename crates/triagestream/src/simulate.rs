//! Canned log output for exercising `watch --stdin`

use chrono::{SecondsFormat, Utc};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Delay between emitted lines
pub const LINE_INTERVAL: Duration = Duration::from_millis(200);

pub const MOCK_LINES: [&str; 8] = [
    "ERROR: JWT token validation failed - invalid signature",
    "ERROR: Database connection timeout after 5000ms",
    "WARN: Memory usage at 87%",
    "ERROR: Null pointer exception in auth.js:42",
    "ERROR: Failed to fetch user data - 500 Internal Server Error",
    "ERROR: Undefined property access: Cannot read property \"id\" of undefined",
    "WARN: Deprecated API endpoint /v1/users called",
    "ERROR: Rate limit exceeded - 429 Too Many Requests",
];

/// `[2024-05-01T12:00:00.000Z] ERROR: ...`
pub fn timestamped(line: &str) -> String {
    format!(
        "[{}] {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        line
    )
}

/// Write every mock line to `out`, pausing `interval` between lines
pub async fn simulate<W>(out: &mut W, interval: Duration) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for (i, line) in MOCK_LINES.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(interval).await;
        }
        out.write_all(timestamped(line).as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}
