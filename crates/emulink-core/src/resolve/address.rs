use tracing::debug;

use crate::config::pointer::MAX_CHAIN_DEPTH;
use crate::config::transport::MAX_ADDRESS;
use crate::model::DataPoint;
use crate::resolve::{parse_hex, resolve_game_key};
use crate::transport::MemoryTransport;

/// Resolve the address a data point currently lives at.
///
/// Points with a `pointer` map follow a pointer chain; all others use their
/// static address map. Any missing entry, malformed hex, null pointer or
/// failed read leaves the point unresolved.
pub fn resolve_address<T: MemoryTransport + ?Sized>(
    transport: &T,
    point: &DataPoint,
    game_id: Option<&str>,
    big_endian_pointers: bool,
) -> Option<u32> {
    let address = match &point.pointer_base {
        Some(pointer_base) => {
            let offsets = point.offsets()?;
            if offsets.len() > MAX_CHAIN_DEPTH {
                debug!(
                    "'{}': pointer chain of {} exceeds {}",
                    point.id,
                    offsets.len(),
                    MAX_CHAIN_DEPTH
                );
                return None;
            }
            let offsets = offsets
                .into_iter()
                .map(parse_hex)
                .collect::<Option<Vec<u64>>>()?;

            let base = parse_hex(resolve_game_key(pointer_base, game_id)?)?;
            follow_pointer_chain(transport, base, &offsets, big_endian_pointers)?
        }
        None => parse_hex(resolve_game_key(&point.static_addresses, game_id)?)?,
    };

    if address > MAX_ADDRESS {
        debug!("'{}': resolved address {:#x} out of range", point.id, address);
        return None;
    }
    Some(address as u32)
}

/// Read the base pointer at `base`, then walk `offsets`.
///
/// Every offset but the last is added and dereferenced; the last is only
/// added. An empty chain yields the base pointer itself. A zero pointer at
/// any step means the structure is not loaded.
pub fn follow_pointer_chain<T: MemoryTransport + ?Sized>(
    transport: &T,
    base: u64,
    offsets: &[u64],
    big_endian: bool,
) -> Option<u64> {
    let mut address = deref(transport, base, big_endian)?;
    let Some((&last, path)) = offsets.split_last() else {
        return Some(address);
    };

    for &offset in path {
        address = deref(transport, address.checked_add(offset)?, big_endian)?;
    }
    address.checked_add(last)
}

fn deref<T: MemoryTransport + ?Sized>(
    transport: &T,
    address: u64,
    big_endian: bool,
) -> Option<u64> {
    match transport.read_u32(address, big_endian) {
        Ok(Some(0)) => {
            debug!("Null pointer at {:#x}", address);
            None
        }
        Ok(Some(pointer)) => Some(pointer as u64),
        Ok(None) => {
            debug!("Short pointer read at {:#x}", address);
            None
        }
        Err(e) => {
            debug!("Pointer read failed at {:#x}: {}", address, e);
            None
        }
    }
}
