use crate::backend::Backend;
use crate::error::RenderError;
use crate::stage::RenderStage;
use fieldwarning_common::{Colour, Extent};

/// Stage that only sets the colour the pass is cleared to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearStage {
    pub colour: Colour,
}

impl ClearStage {
    pub fn new(colour: Colour) -> Self {
        Self { colour }
    }
}

impl<B: Backend> RenderStage<B> for ClearStage {
    type State = ();

    fn name(&self) -> &str {
        "clear"
    }

    fn initialise(&self, _device: &B::Device) -> Result<(), RenderError> {
        Ok(())
    }

    fn bind(
        &self,
        _state: &(),
        _device: &B::Device,
        _pass: &mut B::Pass<'_>,
        _extent: Extent,
    ) -> Result<Option<B::Pipeline>, RenderError> {
        Ok(None)
    }

    fn clear_colour(&self) -> Option<Colour> {
        Some(self.colour)
    }
}
