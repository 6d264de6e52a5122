use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{GatewayError, ModelGateway, StageRole};

type Handler = Box<dyn Fn(StageRole, &str) -> Result<String, GatewayError> + Send + Sync>;

/// Gateway that answers from a closure and records every call
pub struct ScriptedGateway {
    handler: Handler,
    calls: Mutex<Vec<(StageRole, String)>>,
}

impl ScriptedGateway {
    pub fn new(
        handler: impl Fn(StageRole, &str) -> Result<String, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Roles in call order
    pub fn roles(&self) -> Vec<StageRole> {
        self.calls.lock().unwrap().iter().map(|(r, _)| *r).collect()
    }

    pub fn calls_for(&self, role: StageRole) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, content)| content.clone())
            .collect()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn invoke(
        &self,
        role: StageRole,
        _system_prompt: &str,
        user_content: &str,
    ) -> Result<String, GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .push((role, user_content.to_string()));
        (self.handler)(role, user_content)
    }
}

/// Error standing in for a call that exhausted its retries
pub fn exhausted() -> GatewayError {
    GatewayError::Status {
        provider: "Fake",
        status: 503,
        body: "retries exhausted".to_string(),
    }
}
