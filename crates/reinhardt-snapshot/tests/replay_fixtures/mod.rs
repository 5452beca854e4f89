//! Generated by `reinhardt-snapshot` - DO NOT EDIT
use reinhardt_snapshot::replay::prelude::*;
pub mod load_hr_department;
pub mod load_hr_skill;
pub mod load_hr_employee;
pub use load_hr_department::LoadHrDepartment;
pub use load_hr_skill::LoadHrSkill;
pub use load_hr_employee::LoadHrEmployee;
/// Every snapshot loader, in load order.
pub fn fixtures() -> Vec<Box<dyn OrderedFixture>> {
    let mut fixtures: Vec<Box<dyn OrderedFixture>> = Vec::with_capacity(3);
    fixtures.push(Box::new(LoadHrDepartment));
    fixtures.push(Box::new(LoadHrSkill));
    fixtures.push(Box::new(LoadHrEmployee));
    fixtures
}
