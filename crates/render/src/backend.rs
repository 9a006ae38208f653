use crate::error::RenderError;
use fieldwarning_assets::MeshData;
use fieldwarning_common::{Colour, Extent};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// A graphics API the render map can drive.
///
/// Implementations are stateless type bundles; all state lives in the
/// associated `Device` and `Target` values owned by the render map.
pub trait Backend: Sized + 'static {
    /// Device context handed to every stage operation.
    type Device;
    /// Presentation target (window surface, off-screen recorder).
    type Target;
    /// One acquired frame, between `acquire_frame` and `present`.
    type Frame;
    /// Command recorder for the single pass of a frame.
    type Pass<'p>;
    /// Pipeline built for one frame by a stage's `bind`.
    type Pipeline;
    /// Uploaded vertex and index buffers with their vertex-input layout.
    type Mesh;

    fn create_mesh(device: &Self::Device, mesh: &MeshData) -> Result<Self::Mesh, RenderError>;

    fn target_extent(target: &Self::Target) -> Extent;

    fn resize(device: &Self::Device, target: &mut Self::Target, extent: Extent);

    /// Acquire the next frame. `Ok(None)` means the frame should be skipped,
    /// for example because the surface was lost and has been reconfigured.
    fn acquire_frame(
        device: &Self::Device,
        target: &mut Self::Target,
    ) -> Result<Option<Self::Frame>, RenderError>;

    /// Open the frame's pass cleared to `clear`, run `record` inside it and close it.
    fn encode_pass<R>(
        device: &Self::Device,
        frame: &mut Self::Frame,
        clear: Colour,
        record: impl FnOnce(&mut Self::Pass<'_>) -> R,
    ) -> R;

    /// Submit the frame's commands and present it.
    fn present(device: &Self::Device, target: &mut Self::Target, frame: Self::Frame);
}

/// Shared owner of a backend mesh.
///
/// Identity is the allocation: clones are the same mesh, two meshes created
/// from equal data are not. The backend mesh is released with the last handle.
pub struct MeshHandle<B: Backend>(Rc<B::Mesh>);

impl<B: Backend> MeshHandle<B> {
    pub fn new(mesh: B::Mesh) -> Self {
        Self(Rc::new(mesh))
    }

    /// True if both handles share one allocation.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<B: Backend> Clone for MeshHandle<B> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<B: Backend> Deref for MeshHandle<B> {
    type Target = B::Mesh;

    fn deref(&self) -> &B::Mesh {
        &self.0
    }
}

impl<B: Backend> fmt::Debug for MeshHandle<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MeshHandle").field(&Rc::as_ptr(&self.0)).finish()
    }
}

/// Identity comparison of optional handles; two `None`s are the same.
pub fn same_mesh<B: Backend>(a: Option<&MeshHandle<B>>, b: Option<&MeshHandle<B>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.same(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{Headless, HeadlessDevice};
    use crate::headless::tests::quad_mesh;

    #[test]
    fn identity_is_the_allocation() {
        let device = HeadlessDevice::new();
        let data = quad_mesh();
        let a = MeshHandle::<Headless>::new(Headless::create_mesh(&device, &data).unwrap());
        let b = MeshHandle::<Headless>::new(Headless::create_mesh(&device, &data).unwrap());
        let a2 = a.clone();

        assert!(a.same(&a2));
        assert!(!a.same(&b));
        assert_eq!(a.handle_count(), 2);
        assert!(same_mesh(Some(&a), Some(&a2)));
        assert!(!same_mesh(Some(&a), Some(&b)));
        assert!(!same_mesh(Some(&a), None));
        assert!(same_mesh::<Headless>(None, None));
    }

    #[test]
    fn mesh_released_with_last_handle() {
        let device = HeadlessDevice::new();
        let a = MeshHandle::<Headless>::new(Headless::create_mesh(&device, &quad_mesh()).unwrap());
        let a2 = a.clone();
        drop(a);
        assert_eq!(device.ledger().live("mesh"), 1);
        drop(a2);
        assert_eq!(device.ledger().live("mesh"), 0);
        assert_eq!(device.ledger().released("mesh"), 1);
    }
}
