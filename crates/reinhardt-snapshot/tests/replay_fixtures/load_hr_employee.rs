//! Generated by `reinhardt-snapshot` - DO NOT EDIT
//! Snapshot of `hr.Employee`: 2 record(s).
use reinhardt_snapshot::replay::prelude::*;
/// Loads the `hr.Employee` snapshot.
pub struct LoadHrEmployee;
impl OrderedFixture for LoadHrEmployee {
    fn order(&self) -> u32 {
        2
    }
    fn load(
        &self,
        manager: &mut dyn ObjectManager,
        references: &mut ReferenceRepository,
    ) -> SnapshotResult<()> {
        manager.disable_id_generation("hr.Employee");
        let mut item1 = Record::construct(
            "hr.Employee",
            PrimaryKey::Integer(1),
            [("name", Value::from("Ada"))],
        );
        references.add_reference("_reference_hr_Employee_1", &item1);
        let mut item2 = Record::construct(
            "hr.Employee",
            PrimaryKey::Integer(2),
            [("name", Value::from("Grace"))],
        );
        references.add_reference("_reference_hr_Employee_2", &item2);
        item1.set("hired", Value::timestamp("2024-03-01 10:15:00.250")?);
        item1.set("profile", Value::json("{\"desk\":4}")?);
        item1
            .set(
                "department",
                Value::Reference(references.get_reference("_reference_hr_Department_1")?),
            );
        item1
            .set(
                "manager",
                Value::Reference(references.get_reference("_reference_hr_Employee_2")?),
            );
        item1
            .set(
                "skills",
                Value::Collection(
                    Vec::from([
                        references.get_reference("_reference_hr_Skill_rust")?,
                        references.get_reference("_reference_hr_Skill_sql")?,
                    ]),
                ),
            );
        manager.persist(item1)?;
        item2.set("hired", Value::timestamp("2023-01-09 08:00:00")?);
        item2.set("profile", Value::json("{\"desk\":1}")?);
        item2
            .set(
                "department",
                Value::Reference(references.get_reference("_reference_hr_Department_1")?),
            );
        item2
            .set(
                "manager",
                Value::Reference(references.get_reference("_reference_hr_Employee_2")?),
            );
        item2
            .set(
                "skills",
                Value::Collection(
                    Vec::from([references.get_reference("_reference_hr_Skill_sql")?]),
                ),
            );
        manager.persist(item2)?;
        manager.flush()
    }
}
