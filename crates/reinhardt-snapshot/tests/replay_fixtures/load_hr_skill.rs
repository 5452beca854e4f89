//! Generated by `reinhardt-snapshot` - DO NOT EDIT
//! Snapshot of `hr.Skill`: 2 record(s).
use reinhardt_snapshot::replay::prelude::*;
/// Loads the `hr.Skill` snapshot.
pub struct LoadHrSkill;
impl OrderedFixture for LoadHrSkill {
    fn order(&self) -> u32 {
        1
    }
    fn load(
        &self,
        manager: &mut dyn ObjectManager,
        references: &mut ReferenceRepository,
    ) -> SnapshotResult<()> {
        manager.disable_id_generation("hr.Skill");
        let mut item1 = Record::new("hr.Skill", PrimaryKey::from("rust"));
        references.add_reference("_reference_hr_Skill_rust", &item1);
        let mut item2 = Record::new("hr.Skill", PrimaryKey::from("sql"));
        references.add_reference("_reference_hr_Skill_sql", &item2);
        item1.set("label", Value::from("Rust"));
        manager.persist(item1)?;
        item2.set("label", Value::from("SQL"));
        manager.persist(item2)?;
        manager.flush()
    }
}
