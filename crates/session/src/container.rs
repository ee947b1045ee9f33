use backdrop_common::SurfaceId;
use std::cell::RefCell;
use std::rc::Rc;

/// The parent a render surface is inserted into (a DOM element, a window).
pub trait Container {
    fn attach_surface(&mut self, surface: SurfaceId);

    /// Remove a surface. Returns false if it was not attached.
    fn detach_surface(&mut self, surface: SurfaceId) -> bool;

    fn surface_count(&self) -> usize;
}

/// Shared container handle. Sessions keep one so `stop` can detach without
/// the host passing the container again.
pub type ContainerHandle = Rc<RefCell<dyn Container>>;

/// Container that only records which surfaces it holds.
#[derive(Debug, Default)]
pub struct MountPoint {
    attached: Vec<SurfaceId>,
    inserted: u64,
    removed: u64,
}

impl MountPoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn attached(&self) -> &[SurfaceId] {
        &self.attached
    }

    /// Total surfaces ever inserted.
    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Total surfaces ever removed.
    pub fn removed(&self) -> u64 {
        self.removed
    }
}

impl Container for MountPoint {
    fn attach_surface(&mut self, surface: SurfaceId) {
        self.attached.push(surface);
        self.inserted += 1;
    }

    fn detach_surface(&mut self, surface: SurfaceId) -> bool {
        let Some(pos) = self.attached.iter().position(|s| *s == surface) else {
            return false;
        };
        self.attached.remove(pos);
        self.removed += 1;
        true
    }

    fn surface_count(&self) -> usize {
        self.attached.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_detach_counts() {
        let mut mount = MountPoint::new();
        mount.attach_surface(SurfaceId(1));
        mount.attach_surface(SurfaceId(2));
        assert_eq!(mount.surface_count(), 2);

        assert!(mount.detach_surface(SurfaceId(1)));
        assert!(!mount.detach_surface(SurfaceId(1)));
        assert_eq!(mount.attached(), &[SurfaceId(2)]);
        assert_eq!(mount.inserted(), 2);
        assert_eq!(mount.removed(), 1);
    }
}
