//! Model components and their typed collections.
//!
//! Geometric components own a mesh of the matching dimension; collection
//! components (model boundaries, corner/line/surface/block collections)
//! only carry identity and a name. Every component is addressed by uuid
//! inside an insertion-ordered store.

use rustc_hash::FxHashMap;

use super::identifier::{ComponentId, ComponentType, Uuid};
use crate::error::ModelError;
use crate::mesh::{EdgedCurve, PointSet, SolidMesh, SurfaceMesh};

fn dimensional_tag<const D: usize>(
    two: &'static str,
    three: &'static str,
) -> ComponentType {
    ComponentType(match D {
        2 => two,
        _ => three,
    })
}

/// A corner: one model point, meshed as a point set.
#[derive(Clone, Debug)]
pub struct Corner<const D: usize> {
    id: ComponentId,
    name: String,
    mesh: PointSet<D>,
}

impl<const D: usize> Corner<D> {
    pub fn component_type() -> ComponentType {
        dimensional_tag::<D>("Corner2D", "Corner3D")
    }

    pub(crate) fn new(id: Uuid) -> Self {
        Self {
            id: ComponentId::new(Self::component_type(), id),
            name: "unknown".to_string(),
            mesh: PointSet::new(),
        }
    }

    pub fn component_id(&self) -> ComponentId {
        self.id
    }

    pub fn id(&self) -> Uuid {
        self.id.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &PointSet<D> {
        &self.mesh
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn mesh_mut(&mut self) -> &mut PointSet<D> {
        &mut self.mesh
    }

    pub(crate) fn replace_mesh(&mut self, mesh: PointSet<D>) {
        self.mesh = mesh;
    }
}

/// A line: a curve bounded by corners, meshed as an edged curve.
#[derive(Clone, Debug)]
pub struct Line<const D: usize> {
    id: ComponentId,
    name: String,
    mesh: EdgedCurve<D>,
}

impl<const D: usize> Line<D> {
    pub fn component_type() -> ComponentType {
        dimensional_tag::<D>("Line2D", "Line3D")
    }

    pub(crate) fn new(id: Uuid) -> Self {
        Self {
            id: ComponentId::new(Self::component_type(), id),
            name: "unknown".to_string(),
            mesh: EdgedCurve::new(),
        }
    }

    pub fn component_id(&self) -> ComponentId {
        self.id
    }

    pub fn id(&self) -> Uuid {
        self.id.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &EdgedCurve<D> {
        &self.mesh
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn mesh_mut(&mut self) -> &mut EdgedCurve<D> {
        &mut self.mesh
    }

    pub(crate) fn replace_mesh(&mut self, mesh: EdgedCurve<D>) {
        self.mesh = mesh;
    }
}

/// A surface, meshed as a polygonal surface.
#[derive(Clone, Debug)]
pub struct Surface<const D: usize> {
    id: ComponentId,
    name: String,
    mesh: SurfaceMesh<D>,
}

impl<const D: usize> Surface<D> {
    pub fn component_type() -> ComponentType {
        dimensional_tag::<D>("Surface2D", "Surface3D")
    }

    pub(crate) fn new(id: Uuid) -> Self {
        Self {
            id: ComponentId::new(Self::component_type(), id),
            name: "unknown".to_string(),
            mesh: SurfaceMesh::new(),
        }
    }

    pub fn component_id(&self) -> ComponentId {
        self.id
    }

    pub fn id(&self) -> Uuid {
        self.id.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &SurfaceMesh<D> {
        &self.mesh
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn mesh_mut(&mut self) -> &mut SurfaceMesh<D> {
        &mut self.mesh
    }

    pub(crate) fn replace_mesh(&mut self, mesh: SurfaceMesh<D>) {
        self.mesh = mesh;
    }
}

/// A block: a 3D region, meshed as a polyhedral solid.
#[derive(Clone, Debug)]
pub struct Block {
    id: ComponentId,
    name: String,
    mesh: SolidMesh,
}

impl Block {
    pub fn component_type() -> ComponentType {
        ComponentType("Block")
    }

    pub(crate) fn new(id: Uuid) -> Self {
        Self {
            id: ComponentId::new(Self::component_type(), id),
            name: "unknown".to_string(),
            mesh: SolidMesh::new(),
        }
    }

    pub fn component_id(&self) -> ComponentId {
        self.id
    }

    pub fn id(&self) -> Uuid {
        self.id.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &SolidMesh {
        &self.mesh
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn mesh_mut(&mut self) -> &mut SolidMesh {
        &mut self.mesh
    }

    pub(crate) fn replace_mesh(&mut self, mesh: SolidMesh) {
        self.mesh = mesh;
    }
}

macro_rules! meshless_component {
    ($(#[$doc:meta])* $name:ident, $tag:expr) => {
        $(#[$doc])*
        #[derive(Clone, Debug)]
        pub struct $name {
            id: ComponentId,
            name: String,
        }

        impl $name {
            pub fn component_type() -> ComponentType {
                ComponentType($tag)
            }

            pub(crate) fn new(id: Uuid) -> Self {
                Self {
                    id: ComponentId::new(Self::component_type(), id),
                    name: "unknown".to_string(),
                }
            }

            pub fn component_id(&self) -> ComponentId {
                self.id
            }

            pub fn id(&self) -> Uuid {
                self.id.id
            }

            pub fn name(&self) -> &str {
                &self.name
            }

            pub(crate) fn set_name(&mut self, name: impl Into<String>) {
                self.name = name.into();
            }
        }
    };
}

meshless_component!(
    /// A named set of surfaces forming one boundary of the model.
    ModelBoundary,
    "ModelBoundary"
);
meshless_component!(
    /// A named group of corners.
    CornerCollection,
    "CornerCollection"
);
meshless_component!(
    /// A named group of lines.
    LineCollection,
    "LineCollection"
);
meshless_component!(
    /// A named group of surfaces.
    SurfaceCollection,
    "SurfaceCollection"
);
meshless_component!(
    /// A named group of blocks.
    BlockCollection,
    "BlockCollection"
);

/// Insertion-ordered uuid-addressed component store.
#[derive(Clone, Debug)]
pub(crate) struct ComponentStore<C> {
    order: Vec<Uuid>,
    components: FxHashMap<Uuid, C>,
}

impl<C> Default for ComponentStore<C> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            components: FxHashMap::default(),
        }
    }
}

impl<C> ComponentStore<C> {
    pub fn len(&self) -> u32 {
        self.order.len() as u32
    }

    pub fn add(&mut self, id: Uuid, component: C) -> Result<(), ModelError> {
        if self.components.contains_key(&id) {
            return Err(ModelError::DuplicateUuid { id: id.to_string() });
        }
        self.order.push(id);
        self.components.insert(id, component);
        Ok(())
    }

    pub fn remove(&mut self, id: &Uuid) -> Result<C, ModelError> {
        let component = self.components.remove(id).ok_or_else(|| {
            ModelError::ComponentNotFound { id: id.to_string() }
        })?;
        self.order.retain(|existing| existing != id);
        Ok(component)
    }

    pub fn get(&self, id: &Uuid) -> Result<&C, ModelError> {
        self.components.get(id).ok_or_else(|| {
            ModelError::ComponentNotFound { id: id.to_string() }
        })
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Result<&mut C, ModelError> {
        self.components.get_mut(id).ok_or_else(|| {
            ModelError::ComponentNotFound { id: id.to_string() }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.order
            .iter()
            .map(|id| &self.components[id])
    }

    pub fn ids(&self) -> impl Iterator<Item = &Uuid> {
        self.order.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_keeps_insertion_order() {
        let mut store = ComponentStore::default();
        let first = Uuid::new();
        let second = Uuid::new();
        store.add(first, Corner::<3>::new(first)).unwrap();
        store.add(second, Corner::<3>::new(second)).unwrap();
        assert_eq!(store.len(), 2);
        let ids: Vec<Uuid> = store.ids().copied().collect();
        assert_eq!(ids, vec![first, second]);
        assert!(matches!(
            store.add(first, Corner::<3>::new(first)),
            Err(ModelError::DuplicateUuid { .. })
        ));
        store.remove(&first).unwrap();
        assert!(store.get(&first).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn component_tags() {
        assert_eq!(Corner::<2>::component_type().0, "Corner2D");
        assert_eq!(Corner::<3>::component_type().0, "Corner3D");
        assert_eq!(Surface::<3>::component_type().0, "Surface3D");
        assert_eq!(Block::component_type().0, "Block");
        assert_eq!(ModelBoundary::component_type().0, "ModelBoundary");
    }
}
