//! Operation model
//!
//! Each transaction carries exactly one operation. The operation kinds form
//! a closed enum, and each kind owns its own response type, so a read can
//! never hold a write response.

use std::fmt;

use super::{TxId, VersionPayload};

/// Operation kind, used for logging and error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Read,
    Write,
    Remove,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Read => "GET",
            OperationKind::Write => "PUT",
            OperationKind::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response of a read: the chosen version and who wrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadResponse<V> {
    payload: VersionPayload<V>,
    written_by: TxId,
    /// 1-based position of the chosen version. Unset while the response is
    /// still a candidate.
    version_number: Option<u64>,
}

impl<V> ReadResponse<V> {
    /// Creates a candidate response (no version number yet).
    pub fn candidate(payload: VersionPayload<V>, written_by: TxId) -> Self {
        Self {
            payload,
            written_by,
            version_number: None,
        }
    }

    pub fn payload(&self) -> &VersionPayload<V> {
        &self.payload
    }

    /// The transaction whose write this read observes.
    pub fn written_by(&self) -> TxId {
        self.written_by
    }

    pub fn version_number(&self) -> Option<u64> {
        self.version_number
    }

    pub(crate) fn set_version_number(&mut self, version_number: u64) {
        self.version_number = Some(version_number);
    }
}

/// Response of a write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteResponse {
    success: bool,
    version_number: u64,
}

impl WriteResponse {
    pub fn new(success: bool, version_number: u64) -> Self {
        Self {
            success,
            version_number,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.success
    }

    /// Version number the write produced for its key.
    pub fn version_number(&self) -> u64 {
        self.version_number
    }
}

/// Response of a remove: the value the tombstone superseded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoveResponse<V> {
    removed: V,
    version_number: u64,
}

impl<V> RemoveResponse<V> {
    pub fn new(removed: V, version_number: u64) -> Self {
        Self {
            removed,
            version_number,
        }
    }

    pub fn removed(&self) -> &V {
        &self.removed
    }

    /// Version number of the tombstone.
    pub fn version_number(&self) -> u64 {
        self.version_number
    }
}

#[derive(Clone, Debug)]
pub struct ReadOp<K, V> {
    key: K,
    response: Option<ReadResponse<V>>,
}

impl<K, V> ReadOp<K, V> {
    pub fn new(key: K) -> Self {
        Self {
            key,
            response: None,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn response(&self) -> Option<&ReadResponse<V>> {
        self.response.as_ref()
    }

    /// Attaches a response, replacing any tentative one.
    pub fn set_response(&mut self, response: ReadResponse<V>) {
        self.response = Some(response);
    }

    pub fn clear_response(&mut self) {
        self.response = None;
    }
}

#[derive(Clone, Debug)]
pub struct WriteOp<K, V> {
    key: K,
    value: V,
    response: Option<WriteResponse>,
}

impl<K, V> WriteOp<K, V> {
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            response: None,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn response(&self) -> Option<&WriteResponse> {
        self.response.as_ref()
    }

    pub fn set_response(&mut self, response: WriteResponse) {
        self.response = Some(response);
    }
}

#[derive(Clone, Debug)]
pub struct RemoveOp<K, V> {
    key: K,
    response: Option<RemoveResponse<V>>,
}

impl<K, V> RemoveOp<K, V> {
    pub fn new(key: K) -> Self {
        Self {
            key,
            response: None,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn response(&self) -> Option<&RemoveResponse<V>> {
        self.response.as_ref()
    }

    pub fn set_response(&mut self, response: RemoveResponse<V>) {
        self.response = Some(response);
    }
}

/// A single store operation.
#[derive(Clone, Debug)]
pub enum Operation<K, V> {
    Read(ReadOp<K, V>),
    Write(WriteOp<K, V>),
    Remove(RemoveOp<K, V>),
}

impl<K, V> Operation<K, V> {
    pub fn read(key: K) -> Self {
        Operation::Read(ReadOp::new(key))
    }

    pub fn write(key: K, value: V) -> Self {
        Operation::Write(WriteOp::new(key, value))
    }

    pub fn remove(key: K) -> Self {
        Operation::Remove(RemoveOp::new(key))
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Read(_) => OperationKind::Read,
            Operation::Write(_) => OperationKind::Write,
            Operation::Remove(_) => OperationKind::Remove,
        }
    }

    pub fn key(&self) -> &K {
        match self {
            Operation::Read(op) => op.key(),
            Operation::Write(op) => op.key(),
            Operation::Remove(op) => op.key(),
        }
    }

    /// True once a response has been attached.
    pub fn has_response(&self) -> bool {
        match self {
            Operation::Read(op) => op.response().is_some(),
            Operation::Write(op) => op.response().is_some(),
            Operation::Remove(op) => op.response().is_some(),
        }
    }

    pub fn as_read(&self) -> Option<&ReadOp<K, V>> {
        match self {
            Operation::Read(op) => Some(op),
            _ => None,
        }
    }

    pub fn as_read_mut(&mut self) -> Option<&mut ReadOp<K, V>> {
        match self {
            Operation::Read(op) => Some(op),
            _ => None,
        }
    }
}
