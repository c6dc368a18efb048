//! Transaction record
//!
//! Lifecycle: Created -> Started (inside the critical section) -> Ended
//! (response attached, leaving the critical section) -> committed to the
//! history logs. A transaction that fails before its response is attached
//! is dropped and never reaches any log.

use super::{Operation, OperationKind, SessionId, TxId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Created,
    Started,
    Ended,
}

/// One operation plus its identity and session.
#[derive(Clone, Debug)]
pub struct Transaction<K, V> {
    id: TxId,
    session_id: SessionId,
    operation: Operation<K, V>,
    state: TxState,
}

impl<K, V> Transaction<K, V> {
    /// Creates a transaction with a freshly generated id.
    pub fn new(operation: Operation<K, V>, session_id: SessionId) -> Self {
        Self::with_id(TxId::generate(), operation, session_id)
    }

    /// Creates a transaction with an explicit id. Used by tests that build
    /// histories by hand.
    pub fn with_id(id: TxId, operation: Operation<K, V>, session_id: SessionId) -> Self {
        Self {
            id,
            session_id,
            operation,
            state: TxState::Created,
        }
    }

    #[inline]
    pub fn id(&self) -> TxId {
        self.id
    }

    #[inline]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    #[inline]
    pub fn operation(&self) -> &Operation<K, V> {
        &self.operation
    }

    #[inline]
    pub fn operation_mut(&mut self) -> &mut Operation<K, V> {
        &mut self.operation
    }

    #[inline]
    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    #[inline]
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Marks entry into the critical section.
    pub fn start(&mut self) {
        debug_assert_eq!(self.state, TxState::Created);
        self.state = TxState::Started;
    }

    /// Marks exit from the critical section. The response must be attached.
    pub fn end(&mut self) {
        debug_assert_eq!(self.state, TxState::Started);
        debug_assert!(self.operation.has_response());
        self.state = TxState::Ended;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::WriteResponse;

    #[test]
    fn test_lifecycle() {
        let mut tx: Transaction<&str, i32> =
            Transaction::new(Operation::write("k", 1), SessionId::new(7));
        assert_eq!(tx.state(), TxState::Created);
        assert_eq!(tx.session_id(), SessionId::new(7));
        assert_eq!(tx.kind(), OperationKind::Write);

        tx.start();
        assert_eq!(tx.state(), TxState::Started);

        if let Operation::Write(op) = tx.operation_mut() {
            op.set_response(WriteResponse::new(true, 1));
        }
        tx.end();
        assert_eq!(tx.state(), TxState::Ended);
    }

    #[test]
    fn test_ids_assigned_at_creation() {
        let a: Transaction<&str, i32> = Transaction::new(Operation::read("k"), SessionId::DEFAULT);
        let b: Transaction<&str, i32> = Transaction::new(Operation::read("k"), SessionId::DEFAULT);
        assert!(a.id() < b.id());
    }
}
