//! Error taxonomy
use thiserror::Error;

/// Errors reported by every [crate::prelude::Device] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// Generic failure, including operations the platform does not support
    #[error("unexpected failure")]
    Fault,
    /// Valid operation, wrong device state
    #[error("operation not permitted in current state")]
    NotPermitted,
    /// Requested state or operation already in effect
    #[error("already in requested state")]
    Duplicate,
    /// Value outside of its numeric domain, or not knowable right now
    #[error("value out of range")]
    OutOfRange,
    /// Malformed input
    #[error("bad parameter")]
    BadParameter,
    /// Request not supported by this engine
    #[error("not supported")]
    Unsupported,
    /// Sample handle was never issued or has been released
    #[error("invalid sample reference")]
    InvalidHandle,
    /// Every output slot of an accessor was omitted
    #[error("no output requested")]
    NullOutput,
    /// Bounded wait elapsed
    #[error("timed out")]
    Timeout,
}

/// Status as reported at the engine boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Fault,
    NotPermitted,
    Duplicate,
    OutOfRange,
    BadParameter,
    Unsupported,
}

impl Error {
    /// Collapses this error onto the external [Status] set.
    /// Handle and output-slot misuse, as well as timeouts, are faults.
    pub fn status(&self) -> Status {
        match self {
            Self::Fault | Self::InvalidHandle | Self::NullOutput | Self::Timeout => Status::Fault,
            Self::NotPermitted => Status::NotPermitted,
            Self::Duplicate => Status::Duplicate,
            Self::OutOfRange => Status::OutOfRange,
            Self::BadParameter => Status::BadParameter,
            Self::Unsupported => Status::Unsupported,
        }
    }
    /// True when this error reports as [Status::Fault]
    pub fn is_fault(&self) -> bool {
        self.status() == Status::Fault
    }
}

impl<T> From<&Result<T, Error>> for Status {
    fn from(result: &Result<T, Error>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Error, Status};
    use rstest::rstest;

    #[rstest]
    #[case(Error::Fault, Status::Fault)]
    #[case(Error::InvalidHandle, Status::Fault)]
    #[case(Error::NullOutput, Status::Fault)]
    #[case(Error::Timeout, Status::Fault)]
    #[case(Error::NotPermitted, Status::NotPermitted)]
    #[case(Error::Duplicate, Status::Duplicate)]
    #[case(Error::OutOfRange, Status::OutOfRange)]
    #[case(Error::BadParameter, Status::BadParameter)]
    #[case(Error::Unsupported, Status::Unsupported)]
    fn status_mapping(#[case] error: Error, #[case] status: Status) {
        assert_eq!(error.status(), status);
        assert_eq!(Status::from(&Err::<(), _>(error)), status);
    }

    #[test]
    fn ok_status() {
        assert_eq!(Status::from(&Ok::<_, Error>(1)), Status::Ok);
    }
}
