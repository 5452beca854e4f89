//! Generated by `reinhardt-snapshot` - DO NOT EDIT
//! Snapshot of `hr.Department`: 1 record(s).
use reinhardt_snapshot::replay::prelude::*;
/// Loads the `hr.Department` snapshot.
pub struct LoadHrDepartment;
impl OrderedFixture for LoadHrDepartment {
    fn order(&self) -> u32 {
        1
    }
    fn load(
        &self,
        manager: &mut dyn ObjectManager,
        references: &mut ReferenceRepository,
    ) -> SnapshotResult<()> {
        manager.disable_id_generation("hr.Department");
        let mut item1 = Record::new("hr.Department", PrimaryKey::Integer(1));
        references.add_reference("_reference_hr_Department_1", &item1);
        item1.set("name", Value::from("Research"));
        manager.persist(item1)?;
        manager.flush()
    }
}
