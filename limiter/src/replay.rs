//! Replays a request log through a rate limit manager.

use jiff::{SignedDuration, Timestamp};
use rate_limit::{Clock, Decision, QuotaStore, RateKey, RateLimitManager};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One line of output per replayed request.
#[derive(Debug, Serialize)]
struct Outcome<'a> {
    route: &'a str,
    client_id: &'a str,
    allowed: bool,
    limit: u32,
    current: u32,
    remaining: u32,
    reset_at: String,
}

/// Totals of a replay run.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub allowed: u64,
    pub rejected: u64,
    pub skipped: u64,
    pub purged: u64,
}

/// Parse a `route [client_id]` line into a key. Blank lines and `#` comments yield `None`.
///
/// A line without a client id is keyed on the anonymous client. Lines with more than two
/// fields are rejected.
fn parse_line(line: &str) -> Option<anyhow::Result<RateKey>> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let fields: Vec<&str> = line.split_whitespace().collect();

    let key = match fields[..] {
        [route] => RateKey::anonymous(route).map_err(anyhow::Error::from),
        [route, client_id] => RateKey::new(route, client_id).map_err(anyhow::Error::from),
        _ => Err(anyhow::anyhow!(
            "expected `route [client_id]`, found {} fields",
            fields.len()
        )),
    };

    Some(key)
}

pub(crate) async fn replay<S, C, R, W>(
    manager: &RateLimitManager<S, C>,
    input: R,
    output: &mut W,
    purge_every: u64,
) -> anyhow::Result<Summary>
where
    S: QuotaStore,
    C: Clock,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = Summary::default();
    let mut lines = input.lines();
    let mut line_number = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;

        let Some(key) = parse_line(&line) else {
            continue;
        };

        let key = match key {
            Ok(key) => key,
            Err(err) => {
                log::warn!("Skipping line {line_number}: {err}");
                summary.skipped += 1;
                continue;
            }
        };

        let decision = manager.check(&key);

        match decision {
            Decision::Allowed(_) => summary.allowed += 1,
            Decision::Rejected(_) => summary.rejected += 1,
        }

        let status = decision.status();
        let reset_after = SignedDuration::try_from(status.reset_after(manager.now()))?;

        let outcome = Outcome {
            route: key.route(),
            client_id: key.client_id(),
            allowed: decision.is_allowed(),
            limit: status.limit,
            current: status.current,
            remaining: status.remaining,
            reset_at: Timestamp::now().checked_add(reset_after)?.to_string(),
        };

        let mut json = serde_json::to_vec(&outcome)?;
        json.push(b'\n');
        output.write_all(&json).await?;

        let processed = summary.allowed + summary.rejected;

        if purge_every > 0 && processed % purge_every == 0 {
            summary.purged += manager.purge_expired() as u64;
        }
    }

    output.flush().await?;

    Ok(summary)
}
