use super::object::{MeshData, ObjectId, SceneObject, Transform};

/// Index of the selected object, if any.
///
/// The index is re-checked against the object list on every read, so a
/// stale value reads as "nothing selected" rather than a dangling index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection(Option<usize>);

impl Selection {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn select(&mut self, index: usize) {
        self.0 = Some(index);
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// The selected index if it is below `len`.
    pub fn get(&self, len: usize) -> Option<usize> {
        self.0.filter(|&index| index < len)
    }
}

/// Flat list of objects plus the current selection
pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub selection: Selection,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            selection: Selection::none(),
            next_id: 1,
        }
    }

    /// Adds a mesh as a new object with an identity transform.
    ///
    /// The mesh's own name is used when it has one, otherwise
    /// "Imported Object N". Duplicates get a numeric suffix.
    pub fn add_object(&mut self, mesh: MeshData) -> ObjectId {
        let desired = if mesh.name.trim().is_empty() {
            format!("Imported Object {}", self.objects.len())
        } else {
            mesh.name.clone()
        };
        let name = self.ensure_unique_name(&desired);

        let id = ObjectId(self.next_id);
        self.next_id += 1;

        log::info!(
            "Added object '{}' ({} vertices, {} triangles)",
            name,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        self.objects.push(SceneObject {
            id,
            name,
            transform: Transform::default(),
            mesh,
        });
        id
    }

    /// Removes an object, keeping the selection pointed at the same object
    /// when it survives.
    pub fn remove_object(&mut self, index: usize) -> Option<SceneObject> {
        if index >= self.objects.len() {
            return None;
        }
        let removed = self.objects.remove(index);

        match self.selection.0 {
            Some(selected) if selected == index => self.selection.clear(),
            Some(selected) if selected > index => self.selection.select(selected - 1),
            _ => (),
        }

        log::info!("Removed object '{}'", removed.name);
        Some(removed)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selection.get(self.objects.len())
    }

    pub fn selected_object(&self) -> Option<&SceneObject> {
        self.selected_index().and_then(|index| self.objects.get(index))
    }

    pub fn selected_object_mut(&mut self) -> Option<&mut SceneObject> {
        let index = self.selected_index()?;
        self.objects.get_mut(index)
    }

    pub fn select(&mut self, index: Option<usize>) {
        match index {
            Some(index) if index < self.objects.len() => self.selection.select(index),
            _ => self.selection.clear(),
        }
    }

    /// Gets immutable reference to an object by index
    pub fn get_object(&self, index: usize) -> Option<&SceneObject> {
        self.objects.get(index)
    }

    /// Gets mutable reference to an object by index
    pub fn get_object_mut(&mut self, index: usize) -> Option<&mut SceneObject> {
        self.objects.get_mut(index)
    }

    pub fn get_object_count(&self) -> usize {
        self.objects.len()
    }

    /// Indices of objects whose name contains `filter`, ignoring case.
    pub fn filtered_indices(&self, filter: &str) -> Vec<usize> {
        let needle = filter.trim().to_lowercase();
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, object)| needle.is_empty() || object.name.to_lowercase().contains(&needle))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn get_statistics(&self) -> SceneStatistics {
        SceneStatistics {
            object_count: self.objects.len(),
            total_triangles: self.objects.iter().map(|o| o.mesh.triangle_count()).sum(),
            total_vertices: self.objects.iter().map(|o| o.mesh.vertex_count()).sum(),
        }
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();

        while self.objects.iter().any(|obj| obj.name == test_name) {
            counter += 1;
            test_name = format!("{} ({})", desired_name, counter);
        }

        test_name
    }
}

/// Scene statistics for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub total_triangles: usize,
    pub total_vertices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh(name: &str) -> MeshData {
        MeshData::new(
            name,
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[],
            &[0, 1, 2],
        )
    }

    #[test]
    fn test_ids_are_unique_and_stable() {
        let mut scene = Scene::new();
        let a = scene.add_object(mesh("a"));
        let b = scene.add_object(mesh("b"));
        scene.remove_object(0);
        let c = scene.add_object(mesh("c"));

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
        assert_eq!(scene.objects[0].id, b);
    }

    #[test]
    fn test_names_are_made_unique() {
        let mut scene = Scene::new();
        scene.add_object(mesh("cube"));
        scene.add_object(mesh("cube"));
        scene.add_object(mesh(""));
        assert_eq!(scene.objects[1].name, "cube (1)");
        assert_eq!(scene.objects[2].name, "Imported Object 2");
    }

    #[test]
    fn test_out_of_range_selection_reads_as_none() {
        let mut scene = Scene::new();
        scene.add_object(mesh("a"));
        scene.selection.select(5);
        assert!(scene.selected_index().is_none());
        assert!(scene.selected_object().is_none());
        assert!(scene.selected_object_mut().is_none());
    }

    #[test]
    fn test_removing_selected_object_clears_selection() {
        let mut scene = Scene::new();
        scene.add_object(mesh("a"));
        scene.add_object(mesh("b"));
        scene.select(Some(1));
        scene.remove_object(1);
        assert!(scene.selected_index().is_none());
    }

    #[test]
    fn test_removing_earlier_object_keeps_selection_on_same_object() {
        let mut scene = Scene::new();
        scene.add_object(mesh("a"));
        scene.add_object(mesh("b"));
        scene.add_object(mesh("c"));
        scene.select(Some(2));
        scene.remove_object(0);
        assert_eq!(scene.selected_object().map(|o| o.name.as_str()), Some("c"));

        scene.remove_object(1);
        assert!(scene.selected_index().is_none());
    }

    #[test]
    fn test_select_out_of_range_clears() {
        let mut scene = Scene::new();
        scene.add_object(mesh("a"));
        scene.select(Some(0));
        scene.select(Some(3));
        assert!(scene.selected_index().is_none());
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let mut scene = Scene::new();
        scene.add_object(mesh("Teapot"));
        scene.add_object(mesh("bunny"));
        scene.add_object(mesh("teapot lid"));
        assert_eq!(scene.filtered_indices("TEA"), vec![0, 2]);
        assert_eq!(scene.filtered_indices(""), vec![0, 1, 2]);
    }

    #[test]
    fn test_statistics() {
        let mut scene = Scene::new();
        scene.add_object(mesh("a"));
        scene.add_object(mesh("b"));
        let stats = scene.get_statistics();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.total_triangles, 2);
        assert_eq!(stats.total_vertices, 6);
    }
}
