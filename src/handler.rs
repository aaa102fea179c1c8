// Copyright (c) 2025, The Ruskit Authors
// MIT License
// All rights reserved.

//! # Message Handlers
//!
//! A handler receives one decoded payload at a time and answers with a
//! [`Disposition`], the only feedback the application gives the transport.

use async_trait::async_trait;

/// A handler's verdict on one delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Accept the message permanently.
    Ack,
    /// Reject the message and ask the broker to redeliver it.
    NackRequeue,
    /// Reject the message without requeue; it goes to the dead-letter exchange.
    NackDiscard,
}

/// Application logic registered on one subscription.
///
/// Calls are never concurrent within a subscription: the next payload is only
/// handed over after the previous one has been handled and acknowledged.
/// Closures `FnMut(T) -> Disposition` implement this trait directly; implement
/// it by hand when handling needs to await, e.g. to publish a follow-up message.
#[async_trait]
pub trait MessageHandler<T>: Send
where
    T: Send + 'static,
{
    async fn handle(&mut self, payload: T) -> Disposition;
}

#[async_trait]
impl<T, F> MessageHandler<T> for F
where
    T: Send + 'static,
    F: FnMut(T) -> Disposition + Send,
{
    async fn handle(&mut self, payload: T) -> Disposition {
        self(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counting {
        seen: usize,
    }

    #[async_trait]
    impl MessageHandler<u32> for Counting {
        async fn handle(&mut self, payload: u32) -> Disposition {
            self.seen += 1;
            if payload % 2 == 0 {
                Disposition::Ack
            } else {
                Disposition::NackRequeue
            }
        }
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let mut calls = Vec::new();
        let mut handler = |payload: String| {
            calls.push(payload);
            Disposition::NackDiscard
        };

        assert_eq!(handler.handle("a".to_owned()).await, Disposition::NackDiscard);
        assert_eq!(handler.handle("b".to_owned()).await, Disposition::NackDiscard);
        drop(handler);
        assert_eq!(calls, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn stateful_handlers_keep_their_state() {
        let mut handler = Counting { seen: 0 };

        assert_eq!(handler.handle(2).await, Disposition::Ack);
        assert_eq!(handler.handle(3).await, Disposition::NackRequeue);
        assert_eq!(handler.seen, 2);
    }
}
