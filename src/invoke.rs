//! Adapter for hosts that pass every argument as a flat list of strings.
//!
//! `init` takes `[nRecords, recordSize]`; `invoke` dispatches a function name
//! (currently only `readAndWrite`) with the positional workload layout
//! decoded by [`WorkloadRequest::from_args`].

use crate::error::BenchError;
use crate::observe::Observer;
use crate::seeder::Seeder;
use crate::store::KvStore;
use crate::workload::{parse_arg, WorkloadRequest, WorkloadRunner};

/// Function name dispatched to the workload runner.
pub const READ_AND_WRITE: &str = "readAndWrite";

/// Payload returned by successful invocations.
pub const SUCCESS: &[u8] = b"Successful";

/// Decode `[nRecords, recordSize]` and seed the store.
pub fn init<S, O, A>(store: S, observer: O, args: &[A]) -> Result<u64, BenchError>
where
    S: KvStore,
    O: Observer,
    A: AsRef<str>,
{
    if args.len() != 2 {
        return Err(BenchError::ArgumentCount {
            expected: 2,
            actual: args.len(),
        });
    }
    let n_records: u64 = parse_arg("nRecords", args[0].as_ref())?;
    let record_size: usize = parse_arg("recordSize", args[1].as_ref())?;

    Seeder::new(store, observer).seed(n_records, record_size)
}

/// Dispatch `function` with flat `args`.
pub fn invoke<S, O, A>(
    store: S,
    observer: O,
    function: &str,
    args: &[A],
) -> Result<Vec<u8>, BenchError>
where
    S: KvStore,
    O: Observer,
    A: AsRef<str>,
{
    match function {
        READ_AND_WRITE => {
            let request = WorkloadRequest::from_args(args)?;
            WorkloadRunner::new(store, observer).run(&request)?;
            Ok(SUCCESS.to_vec())
        }
        other => Err(BenchError::UnknownFunction(other.to_string())),
    }
}
