pub mod inspect;
pub mod run;

use comfy_table::{ContentArrangement, Table};

use kw_core::World;

use crate::scene::{Health, Scene, Transform, Velocity};

/// One row per entity still holding components.
fn entity_table(world: &World<Scene>) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Entity", "Transform", "Velocity", "Health"]);

    for entity in world.entities() {
        table.add_row(vec![
            entity.to_string(),
            cell(world.get_component::<Transform>(entity)),
            cell(world.get_component::<Velocity>(entity)),
            cell(world.get_component::<Health>(entity)),
        ]);
    }
    table
}

fn cell<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "--".to_string(), ToString::to_string)
}
