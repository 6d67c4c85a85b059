use crate::{
    ast::{FieldId, InlineFragmentId, SelectionSetId},
    planner::error::PlannerError,
};

/// Where the next upstream node attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Operation,
    SelectionSet(SelectionSetId),
    Field(FieldId),
    InlineFragment(InlineFragmentId),
}

/// Attachment points, paired with the enter and leave events of the walk.
///
/// Every enter event records a mark and the matching leave event truncates back
/// to it, so events that attach zero or several containers still unwind exactly.
#[derive(Debug, Default)]
pub struct ContainerStack {
    containers: Vec<Container>,
    marks: Vec<usize>,
}

impl ContainerStack {
    pub fn clear(&mut self) {
        self.containers.clear();
        self.marks.clear();
    }

    pub fn push(&mut self, container: Container) {
        self.containers.push(container);
    }

    pub fn mark(&mut self) {
        self.marks.push(self.containers.len());
    }

    pub fn unwind(&mut self) -> Result<(), PlannerError> {
        let mark = self
            .marks
            .pop()
            .ok_or_else(|| PlannerError::Internal("unbalanced leave event".to_string()))?;
        self.containers.truncate(mark);
        Ok(())
    }

    pub fn top(&self) -> Result<Container, PlannerError> {
        self.containers
            .last()
            .copied()
            .ok_or_else(|| PlannerError::Internal("container stack is empty".to_string()))
    }

    pub fn current_selection_set(&self) -> Result<SelectionSetId, PlannerError> {
        match self.top()? {
            Container::SelectionSet(id) => Ok(id),
            other => Err(PlannerError::Internal(format!(
                "expected a selection set on top of the container stack, found {:?}",
                other
            ))),
        }
    }

    pub fn contains_field(&self) -> bool {
        self.containers
            .iter()
            .any(|container| matches!(container, Container::Field(_)))
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Container, ContainerStack};
    use crate::{ast::UpstreamDocument, planner::error::PlannerError};

    #[test]
    fn unwinds_to_the_mark_of_the_enter_event() {
        let mut document = UpstreamDocument::default();
        let root = document.new_selection_set();
        let entities = document.new_selection_set();

        let mut stack = ContainerStack::default();
        assert!(matches!(stack.top(), Err(PlannerError::Internal(_))));

        stack.push(Container::Operation);
        stack.mark();
        stack.push(Container::SelectionSet(root));
        stack.push(Container::SelectionSet(entities));
        assert_eq!(stack.current_selection_set().unwrap(), entities);

        stack.unwind().unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.top().unwrap(), Container::Operation);
        assert!(stack.current_selection_set().is_err());
        assert!(matches!(stack.unwind(), Err(PlannerError::Internal(_))));
    }
}
