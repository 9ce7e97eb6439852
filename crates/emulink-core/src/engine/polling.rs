use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use super::{CancelToken, GameSnapshot, Observable};
use crate::formula::evaluate;
use crate::model::{DataPoint, ProfileConfig};
use crate::resolve::{decode_value, resolve_address};
use crate::transport::MemoryTransport;

/// Read every data point of `profile` once, in declared order.
///
/// Points that fail to resolve or read are left out of the snapshot.
pub fn sweep<T: MemoryTransport + ?Sized>(
    transport: &T,
    profile: &ProfileConfig,
    game_id: Option<&str>,
) -> GameSnapshot {
    let big_endian = profile.big_endian_pointers();
    let mut snapshot = GameSnapshot {
        profile_id: Some(profile.id.clone()),
        ..GameSnapshot::default()
    };

    for point in &profile.data_points {
        let Some(address) = resolve_address(transport, point, game_id, big_endian) else {
            continue;
        };
        let Some(raw) = read_point(transport, point, address) else {
            continue;
        };

        let value = match point.formula.as_deref() {
            Some(formula) if !formula.trim().is_empty() => evaluate(formula, raw),
            _ => raw,
        };
        snapshot.raw.insert(point.id.clone(), raw);
        snapshot.values.insert(point.id.clone(), value);
    }

    snapshot.connected = !snapshot.raw.is_empty();
    snapshot.updated_at = Some(Utc::now());
    snapshot
}

fn read_point<T: MemoryTransport + ?Sized>(
    transport: &T,
    point: &DataPoint,
    address: u32,
) -> Option<f64> {
    match transport.read(address as u64, point.byte_size) {
        Ok(bytes) if bytes.len() >= point.byte_size => {
            Some(decode_value(&bytes, point.value_type))
        }
        Ok(bytes) => {
            debug!(
                "'{}': short read at {:#x} ({} of {} bytes)",
                point.id,
                address,
                bytes.len(),
                point.byte_size
            );
            None
        }
        Err(e) => {
            debug!("'{}': read failed: {}", point.id, e);
            None
        }
    }
}

/// Sweep until cancelled, publishing one snapshot per sweep.
pub(super) fn run<T: MemoryTransport + ?Sized>(
    transport: &T,
    profile: &ProfileConfig,
    game_id: &str,
    interval: Duration,
    snapshots: &Observable<GameSnapshot>,
    cancel: &CancelToken,
) {
    let mut connected = None;

    while !cancel.is_cancelled() {
        let snapshot = sweep(transport, profile, Some(game_id));
        if cancel.is_cancelled() {
            break;
        }

        if connected != Some(snapshot.connected) {
            info!(
                "{}: {} of {} data points readable",
                game_id,
                snapshot.raw.len(),
                profile.data_points.len()
            );
            connected = Some(snapshot.connected);
        }
        snapshots.publish(snapshot);

        if cancel.wait(interval) {
            break;
        }
    }
    debug!("Polling stopped for {}", game_id);
}
