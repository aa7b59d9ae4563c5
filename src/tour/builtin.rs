//! Built-in resource planning tours
//!
//! Both tours create a weekly resource through the list view's form. The
//! values typed into the form come from [`ResourceFormFixture`]; its default
//! is the data set the acceptance suite has always used.

use super::definition::StandardStep;
use super::model::{Step, Tour, TourOptions, WaitPosition};
use super::registry::TourRegistry;
use crate::common::Result;

pub const CREATE_TOUR: &str = "tour_test_create";
pub const NAVIGATION_TOUR: &str = "tour_test_navigation";

const MENU_RESOURCE: &str = r#".o_app[data-menu-xmlid="resource_planning.menu_resource"]"#;
const DATE_PICKER_CLOSE: &str = ".fa-check";

/// Values entered into the resource form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFormFixture {
    pub project: String,
    pub employee: String,
    pub base_workload: String,
    pub start_date: String,
    pub end_date: String,
}

impl Default for ResourceFormFixture {
    fn default() -> Self {
        Self {
            project: "Office Design".to_string(),
            employee: "Mitchell Admin".to_string(),
            base_workload: "100".to_string(),
            start_date: "2020-04-05 13:42:07".to_string(),
            end_date: "2020-07-05 13:42:07".to_string(),
        }
    }
}

/// Description keys that differ between the two tours
struct FormHints {
    open_app: Option<&'static str>,
    start_date: &'static str,
    end_date: &'static str,
}

const CREATE_HINTS: FormHints = FormHints {
    open_app: None,
    start_date: "choose start_date",
    end_date: "choose end_date",
};

const NAVIGATION_HINTS: FormHints = FormHints {
    open_app: Some("hello this is a test"),
    start_date: "choose start_date.",
    end_date: "choose end_date.",
};

fn test_options() -> TourOptions {
    TourOptions {
        is_test_mode: true,
        start_url: "/web".to_string(),
    }
}

/// Open the app, create a resource, fill and save the form
fn resource_form_steps(fixture: &ResourceFormFixture, hints: &FormHints) -> Vec<Step> {
    let mut open_app = Step::new(MENU_RESOURCE).at(WaitPosition::Bottom);
    if let Some(hint) = hints.open_app {
        open_app = open_app.with_description(hint);
    }

    vec![
        StandardStep::ShowAppsMenuItem.step(),
        open_app,
        Step::new(".o_list_button_add")
            .with_description("create a new resource")
            .at(WaitPosition::Bottom),
        Step::new(r#"select[name="project"]"#)
            .with_description("choose a project")
            .enter_text(&fixture.project)
            .at(WaitPosition::Right),
        Step::new(r#"select[name="employee"]"#)
            .with_description("choose a employee")
            .enter_text(&fixture.employee)
            .at(WaitPosition::Right),
        Step::new(r#"input[name="base_workload"]"#)
            .with_description("set workload.")
            .enter_text(&fixture.base_workload)
            .at(WaitPosition::Right),
        Step::new(r#"input[name="start_date"]"#)
            .with_description(hints.start_date)
            .enter_text(&fixture.start_date)
            .at(WaitPosition::Right),
        Step::new(DATE_PICKER_CLOSE)
            .with_description("Close Picker")
            .at(WaitPosition::Bottom),
        Step::new(r#"input[name="end_date"]"#)
            .with_description(hints.end_date)
            .enter_text(&fixture.end_date)
            .at(WaitPosition::Right),
        Step::new(DATE_PICKER_CLOSE)
            .with_description("Close Picker")
            .at(WaitPosition::Bottom),
        Step::new(".o_form_button_save")
            .with_description("Save the resource")
            .at(WaitPosition::Bottom),
    ]
}

/// Create a resource, then return to the create/edit view
pub fn create_tour(fixture: &ResourceFormFixture) -> Result<Tour> {
    let mut steps = resource_form_steps(fixture, &CREATE_HINTS);
    steps.push(
        Step::new(
            r#".o_menu_entry_lvl_1[data-menu-xmlid="resource_planning.menu_resource_test"]"#,
        )
        .with_description("Return to Create/Edit View")
        .at(WaitPosition::Bottom),
    );
    Tour::new(CREATE_TOUR, test_options(), steps)
}

/// Create a resource, then open the weekly overview per employee
pub fn navigation_tour(fixture: &ResourceFormFixture) -> Result<Tour> {
    let mut steps = resource_form_steps(fixture, &NAVIGATION_HINTS);
    steps.extend([
        Step::new(r#".dropdown-toggle[data-menu-xmlid="resource_planning.menu_weekly"]"#)
            .with_description("Open the Overview")
            .at(WaitPosition::Bottom),
        Step::new(
            r#".o_menu_entry_lvl_2[data-menu-xmlid="resource_planning.menu_weekly_employee"]"#,
        )
        .with_description("Open the Overview")
        .at(WaitPosition::Bottom),
        Step::new(".dropdown-toggle")
            .with_description("Open the Overview")
            .at(WaitPosition::Bottom),
    ]);
    Tour::new(NAVIGATION_TOUR, test_options(), steps)
}

/// Register both built-in tours
pub fn register_builtins(registry: &mut TourRegistry, fixture: &ResourceFormFixture) -> Result<()> {
    registry.register(create_tour(fixture)?)?;
    registry.register(navigation_tour(fixture)?)?;
    Ok(())
}
