//! Scripted transport for exercising the engine without a server.

use crate::transport::{RpcExchange, RpcTransport, TransportError};
use async_trait::async_trait;
use msgsync_proto::{CommandResponse, RpcRequest, RpcResponse};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A transport that replays scripted replies and records every request.
///
/// Replies are consumed in push order. Once the script is exhausted the
/// mock acknowledges every command with `"ok"`, so tests only script the
/// cycles they care about; use [`MockTransport::strict`] to fail instead.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<RpcExchange, TransportError>>>,
    requests: Mutex<Vec<RpcRequest>>,
    strict: bool,
}

impl MockTransport {
    /// A mock that acknowledges everything once its script runs out.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that fails the exchange once its script runs out.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Script a successful exchange with no retry hint.
    pub fn push_response(&self, response: RpcResponse) {
        self.push_exchange(RpcExchange::new(response));
    }

    /// Script a successful exchange.
    pub fn push_exchange(&self, exchange: RpcExchange) {
        self.script.lock().unwrap().push_back(Ok(exchange));
    }

    /// Script a whole-batch failure.
    pub fn push_error(&self, error: TransportError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RpcRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for MockTransport {
    async fn exchange(&self, request: &RpcRequest) -> Result<RpcExchange, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        if self.strict {
            return Err(TransportError::Request("mock script exhausted".into()));
        }

        Ok(RpcExchange::new(RpcResponse {
            profile: None,
            responses: Some(vec![
                CommandResponse::with_result("ok");
                request.commands.len()
            ]),
            events: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgsync_core::Subject;
    use msgsync_proto::Command;
    use uuid::Uuid;

    fn request(commands: Vec<Command>) -> RpcRequest {
        RpcRequest::new("client-1", Uuid::new_v4(), commands)
    }

    #[test]
    fn scripted_replies_play_in_order() {
        let mock = MockTransport::new();
        mock.push_response(RpcResponse {
            profile: Some("p-1".into()),
            responses: Some(vec![]),
            events: Vec::new(),
        });
        mock.push_error(TransportError::Status {
            status: 503,
            retry_after: None,
        });

        tokio_test::block_on(async {
            let first = mock.exchange(&request(vec![])).await.unwrap();
            assert_eq!(first.response.profile.as_deref(), Some("p-1"));

            let second = mock.exchange(&request(vec![])).await;
            assert!(matches!(second, Err(TransportError::Status { status: 503, .. })));
        });
    }

    #[test]
    fn exhausted_script_acks_each_command() {
        let mock = MockTransport::new();
        let commands = vec![
            Command::subscribe(Subject::new("room1"), None, None),
            Command::unsubscribe(Subject::new("room1")),
        ];

        tokio_test::block_on(async {
            let exchange = mock.exchange(&request(commands)).await.unwrap();
            let responses = exchange.response.responses.unwrap();
            assert_eq!(responses.len(), 2);
            assert!(responses.iter().all(|r| !r.requests_retry()));
        });
    }

    #[test]
    fn strict_mock_fails_when_exhausted() {
        let mock = MockTransport::strict();
        tokio_test::block_on(async {
            let result = mock.exchange(&request(vec![])).await;
            assert!(matches!(result, Err(TransportError::Request(_))));
        });
    }

    #[test]
    fn requests_are_recorded() {
        let mock = MockTransport::new();
        tokio_test::block_on(async {
            mock.exchange(&request(vec![Command::unsubscribe(Subject::new("a"))]))
                .await
                .unwrap();
            mock.exchange(&request(vec![])).await.unwrap();
        });

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].commands.len(), 1);
    }
}
