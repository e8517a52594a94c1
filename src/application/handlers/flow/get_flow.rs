//! GetFlowHandler - Query handler for a flow definition.

use std::sync::Arc;

use crate::domain::flow::{FlowDefinition, FlowError, FlowRegistry};
use crate::domain::foundation::FlowId;

pub struct GetFlowHandler {
    flows: Arc<FlowRegistry>,
}

impl GetFlowHandler {
    pub fn new(flows: Arc<FlowRegistry>) -> Self {
        Self { flows }
    }

    pub fn handle(&self, flow_id: &FlowId) -> Result<Arc<FlowDefinition>, FlowError> {
        self.flows
            .require(flow_id)
            .map(|flow| flow.definition.clone())
    }
}
