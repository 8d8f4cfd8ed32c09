//! Toolsets: where an agent gets its tools from.
//!
//! An [`OpenApiToolSet`](super::OpenApiToolSet) is the usual source. Loose
//! tools go in a [`ToolList`], and an agent with several sources sees them
//! through one [`ToolsetGroup`].

use std::sync::Arc;

use super::base_tool::BaseTool;

#[async_trait::async_trait]
pub trait BaseToolset: Send + Sync {
    async fn get_tools(&self) -> Vec<Arc<dyn BaseTool>>;

    /// Releases whatever the toolset holds open. Called once per agent.
    async fn close(&self) {}
}

/// A fixed list of tools.
#[derive(Default)]
pub struct ToolList(Vec<Arc<dyn BaseTool>>);

impl ToolList {
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn BaseTool>) -> Self {
        self.0.push(tool);
        self
    }
}

impl FromIterator<Arc<dyn BaseTool>> for ToolList {
    fn from_iter<I: IntoIterator<Item = Arc<dyn BaseTool>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[async_trait::async_trait]
impl BaseToolset for ToolList {
    async fn get_tools(&self) -> Vec<Arc<dyn BaseTool>> {
        self.0.clone()
    }
}

/// Several toolsets offered as one, in insertion order.
pub struct ToolsetGroup {
    members: Vec<Arc<dyn BaseToolset>>,
}

impl ToolsetGroup {
    /// Returns the single member unwrapped, or `None` when there are none.
    pub fn collapse(mut members: Vec<Arc<dyn BaseToolset>>) -> Option<Arc<dyn BaseToolset>> {
        match members.len() {
            0 => None,
            1 => members.pop(),
            _ => Some(Arc::new(Self { members })),
        }
    }
}

#[async_trait::async_trait]
impl BaseToolset for ToolsetGroup {
    async fn get_tools(&self) -> Vec<Arc<dyn BaseTool>> {
        let mut tools = Vec::new();
        for member in &self.members {
            tools.extend(member.get_tools().await);
        }
        tools
    }

    async fn close(&self) {
        for member in &self.members {
            member.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingTool;
    use crate::tools::ToolResult;

    fn named(name: &str) -> Arc<dyn BaseTool> {
        Arc::new(RecordingTool::new(name, name, Vec::<ToolResult>::new()))
    }

    async fn names(toolset: &dyn BaseToolset) -> Vec<String> {
        toolset
            .get_tools()
            .await
            .iter()
            .map(|t| t.name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn group_lists_members_in_order() {
        let pets: Arc<dyn BaseToolset> = Arc::new([named("addPet"), named("getPetById")].into_iter().collect::<ToolList>());
        let store: Arc<dyn BaseToolset> = Arc::new(ToolList::default().with_tool(named("getInventory")));

        let group = ToolsetGroup::collapse(vec![pets, store]).unwrap();
        assert_eq!(names(group.as_ref()).await, ["addPet", "getPetById", "getInventory"]);
        group.close().await;
    }

    #[tokio::test]
    async fn collapse_unwraps_a_single_member() {
        assert!(ToolsetGroup::collapse(Vec::new()).is_none());

        let only: Arc<dyn BaseToolset> = Arc::new(ToolList::default().with_tool(named("getInventory")));
        let collapsed = ToolsetGroup::collapse(vec![only.clone()]).unwrap();
        assert!(Arc::ptr_eq(&only, &collapsed));
    }
}
