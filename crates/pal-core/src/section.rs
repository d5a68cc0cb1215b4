//! Section resolution and candidate narrowing.
//!
//! All functions here are pure: they take the already-loaded parent entities
//! as parameters and return the resolved section or the narrowed candidate set.

use crate::entities::{Competency, CompetencyGroup, Person, TrainingSection};

/// Pick the training section a dive group made of `members` should follow.
///
/// The least experienced member (by [`Level::rank`](crate::enums::Level::rank))
/// that belongs to at least one section decides: their first section is
/// returned. Among members of equal level the earliest in `members` wins.
/// Returns `None` when no member belongs to any section.
#[must_use]
pub fn resolve_section(members: &[Person]) -> Option<&str> {
    members
        .iter()
        .filter(|member| !member.section_ids.is_empty())
        .min_by_key(|member| member.level.rank())
        .and_then(|member| member.section_ids.first())
        .map(String::as_str)
}

/// Students eligible for `section`.
///
/// Students enrolled in the section come first. When none is, students are
/// picked by level from the section's track; sections with an unknown track
/// admit every student.
#[must_use]
pub fn eligible_students<'a>(section: &TrainingSection, people: &'a [Person]) -> Vec<&'a Person> {
    let students = people.iter().filter(|person| person.is_student());

    let enrolled: Vec<&Person> = students
        .clone()
        .filter(|person| person.section_ids.iter().any(|id| id == &section.id))
        .collect();
    if !enrolled.is_empty() {
        return enrolled;
    }

    match section.track() {
        Some(track) => {
            let levels = track.fallback_levels();
            students
                .filter(|person| levels.contains(&person.level))
                .collect()
        }
        None => students.collect(),
    }
}

/// Competencies that may be planned for a group following `section_id`.
#[must_use]
pub fn candidate_competencies<'a>(
    section_id: &str,
    groups: &[CompetencyGroup],
    competencies: &'a [Competency],
) -> Vec<&'a Competency> {
    competencies
        .iter()
        .filter(|competency| {
            groups
                .iter()
                .any(|group| group.id == competency.group_id && group.section_id == section_id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Level, Role};
    use chrono::Utc;

    fn student(id: &str, level: Level, sections: &[&str]) -> Person {
        Person {
            id: id.into(),
            first_name: id.into(),
            last_name: "Diver".into(),
            email: None,
            role: Role::Student,
            level,
            section_ids: sections.iter().map(|s| (*s).to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn section(id: &str, code: &str) -> TrainingSection {
        TrainingSection {
            id: id.into(),
            code: code.into(),
            name: code.into(),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lowest_level_member_decides() {
        let members = vec![
            student("c", Level::Niveau3, &["sec-n3"]),
            student("a", Level::Niveau1, &["sec-n1", "sec-extra"]),
            student("b", Level::Niveau2, &["sec-n2"]),
        ];
        assert_eq!(resolve_section(&members), Some("sec-n1"));
    }

    #[test]
    fn members_without_section_are_skipped() {
        let members = vec![
            student("a", Level::Niveau1, &[]),
            student("b", Level::Niveau2, &["sec-n2"]),
            student("c", Level::Niveau3, &["sec-n3"]),
        ];
        assert_eq!(resolve_section(&members), Some("sec-n2"));
    }

    #[test]
    fn no_section_anywhere_resolves_nothing() {
        let members = vec![
            student("a", Level::Niveau1, &[]),
            student("b", Level::Niveau2, &[]),
        ];
        assert_eq!(resolve_section(&members), None);
        assert_eq!(resolve_section(&[]), None);
    }

    #[test]
    fn rank_not_lexical_order_decides() {
        // "moniteur_federal1" < "niveau3" as strings; rank says otherwise.
        let members = vec![
            student("mf", Level::MoniteurFederal1, &["sec-mf"]),
            student("n3", Level::Niveau3, &["sec-n3"]),
        ];
        assert_eq!(resolve_section(&members), Some("sec-n3"));
    }

    #[test]
    fn ties_keep_member_order() {
        let members = vec![
            student("first", Level::Niveau2, &["sec-a"]),
            student("second", Level::Niveau2, &["sec-b"]),
        ];
        assert_eq!(resolve_section(&members), Some("sec-a"));
    }

    #[test]
    fn enrolled_students_are_preferred() {
        let prep = section("sec-p1", "prepa_niveau1");
        let people = vec![
            student("enrolled", Level::Niveau2, &["sec-p1"]),
            student("beginner", Level::Debutant, &[]),
        ];
        let eligible = eligible_students(&prep, &people);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, "enrolled");
    }

    #[test]
    fn level_fallback_when_nobody_enrolled() {
        let prep = section("sec-p1", "prepa_niveau1");
        let mut supervisor = student("boss", Level::Debutant, &[]);
        supervisor.role = Role::Supervisor;
        let people = vec![
            student("beginner", Level::Debutant, &[]),
            student("n1", Level::Niveau1, &[]),
            student("n2", Level::Niveau2, &[]),
            supervisor,
        ];
        let ids: Vec<&str> = eligible_students(&prep, &people)
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["beginner", "n1"]);
    }

    #[test]
    fn unknown_track_admits_all_students() {
        let nitrox = section("sec-nx", "nitrox");
        let people = vec![
            student("a", Level::Niveau1, &[]),
            student("b", Level::Niveau3, &[]),
        ];
        assert_eq!(eligible_students(&nitrox, &people).len(), 2);
    }

    #[test]
    fn candidate_competencies_follow_section() {
        let now = Utc::now();
        let groups = vec![
            CompetencyGroup {
                id: "cgr-1".into(),
                section_id: "sec-a".into(),
                title: "Immersion".into(),
                description: None,
                created_at: now,
            },
            CompetencyGroup {
                id: "cgr-2".into(),
                section_id: "sec-b".into(),
                title: "Autonomy".into(),
                description: None,
                created_at: now,
            },
        ];
        let competency = |id: &str, group: &str| Competency {
            id: id.into(),
            group_id: group.into(),
            name: id.into(),
            description: None,
            created_at: now,
        };
        let competencies = vec![competency("cmp-1", "cgr-1"), competency("cmp-2", "cgr-2")];

        let picked = candidate_competencies("sec-a", &groups, &competencies);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id, "cmp-1");
    }
}
