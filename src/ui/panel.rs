//! Editor panels: the object list and the properties of the selected object.
//!
//! Transform edits are applied to the scene directly. Anything that needs
//! more than the scene (dialogs, the camera) is returned as a [`PanelAction`].

use cgmath::Vector3;

use crate::gfx::scene::{Scene, Transform};

const PANEL_WIDTH: f32 = 320.0;
const PANEL_MARGIN: f32 = 10.0;

/// Request raised by a panel for the application to carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    Import,
    Export,
    Remove(usize),
    Focus(usize),
    Select(usize),
}

/// Panel state that lives across frames
#[derive(Debug, Default)]
pub struct ObjectListState {
    pub filter: String,
    /// Last import/export outcome, shown under the buttons
    pub message: Option<String>,
}

/// Movement bounds state and camera position for the status line
#[derive(Debug, Clone, Copy)]
pub struct StatusInfo {
    pub bounds_enabled: bool,
    pub camera_position: Vector3<f32>,
}

pub fn status_text(info: &StatusInfo) -> String {
    let p = info.camera_position;
    format!(
        "Bounds: {} | Camera: ({:.2}, {:.2}, {:.2})",
        if info.bounds_enabled { "on" } else { "off" },
        p.x,
        p.y,
        p.z
    )
}

/// Import/Export buttons, a search box and the filtered object list.
pub fn object_list_panel(
    ui: &imgui::Ui,
    scene: &Scene,
    state: &mut ObjectListState,
    status: &StatusInfo,
    actions: &mut Vec<PanelAction>,
) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Objects")
        .size([PANEL_WIDTH, 360.0], imgui::Condition::FirstUseEver)
        .position([PANEL_MARGIN, PANEL_MARGIN], imgui::Condition::FirstUseEver)
        .resizable(true)
        .build(|| {
            if ui.button("Import") {
                actions.push(PanelAction::Import);
            }
            ui.same_line();
            ui.disabled(scene.selected_index().is_none(), || {
                if ui.button("Export") {
                    actions.push(PanelAction::Export);
                }
            });

            if let Some(message) = &state.message {
                ui.text_wrapped(message);
            }

            ui.separator();
            ui.input_text("Search", &mut state.filter).build();

            let selected = scene.selected_index();
            ui.child_window("object_list")
                .size([0.0, 180.0])
                .border(true)
                .build(|| {
                    let indices = scene.filtered_indices(&state.filter);
                    if indices.is_empty() {
                        ui.text_disabled("No objects");
                    }
                    for index in indices {
                        let Some(object) = scene.get_object(index) else {
                            continue;
                        };
                        // ImGui ids must stay unique even for equal names
                        let label = format!("{}##{}", object.name, object.id.0);
                        if ui
                            .selectable_config(&label)
                            .selected(selected == Some(index))
                            .allow_double_click(true)
                            .build()
                        {
                            if ui.is_mouse_double_clicked(imgui::MouseButton::Left) {
                                actions.push(PanelAction::Focus(index));
                            } else {
                                actions.push(PanelAction::Select(index));
                            }
                        }
                    }
                });

            let stats = scene.get_statistics();
            ui.text(format!(
                "{} objects, {} triangles",
                stats.object_count, stats.total_triangles
            ));
            ui.separator();
            ui.text(status_text(status));
        });
}

/// Position, rotation and scale editors for the selected object.
pub fn object_properties_panel(ui: &imgui::Ui, scene: &mut Scene, actions: &mut Vec<PanelAction>) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    let x = (display_size[0] - PANEL_WIDTH - PANEL_MARGIN).max(PANEL_MARGIN);
    ui.window("Properties")
        .size([PANEL_WIDTH, 380.0], imgui::Condition::FirstUseEver)
        .position([x, PANEL_MARGIN], imgui::Condition::FirstUseEver)
        .resizable(true)
        .build(|| {
            let Some(index) = scene.selected_index() else {
                ui.text("No object selected.");
                return;
            };
            let Some(object) = scene.get_object_mut(index) else {
                return;
            };

            ui.text(format!("Selected: {}", object.name));
            ui.text_disabled(format!(
                "{} vertices, {} triangles",
                object.mesh.vertex_count(),
                object.mesh.triangle_count()
            ));
            ui.separator();

            transform_controls(ui, &mut object.transform);

            ui.separator();
            if ui.button("Remove") {
                actions.push(PanelAction::Remove(index));
            }
        });
}

fn transform_controls(ui: &imgui::Ui, transform: &mut Transform) {
    if ui.collapsing_header("Position", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        drag_vector(ui, "##position", &mut transform.position, Some((-100.0, 100.0)));
        if ui.button("Reset##position") {
            transform.reset_position();
        }
    }

    if ui.collapsing_header("Rotation", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        drag_vector(ui, "##rotation", &mut transform.rotation, None);
        if ui.button("Reset##rotation") {
            transform.reset_rotation();
        }
    }

    if ui.collapsing_header("Scale", imgui::TreeNodeFlags::DEFAULT_OPEN) {
        drag_vector(ui, "##scale", &mut transform.scale, Some((0.1, 100.0)));
        if ui.button("Reset##scale") {
            transform.reset_scale();
        }
    }
}

/// Three-component drag with step 0.1.
fn drag_vector(ui: &imgui::Ui, label: &str, value: &mut Vector3<f32>, range: Option<(f32, f32)>) {
    let mut components: [f32; 3] = (*value).into();
    let mut drag = imgui::Drag::new(label).speed(0.1).display_format("%.2f");
    if let Some((min, max)) = range {
        drag = drag.range(min, max);
    }
    if drag.build_array(ui, &mut components) {
        *value = components.into();
    }
}
