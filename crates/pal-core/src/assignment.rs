//! Dive group planning: partitions a session roster into supervised groups
//! and autonomous pods.
//!
//! Planning is pure. The database layer persists an [`AssignmentPlan`] in a
//! single transaction, either additively (interactive assignment) or after
//! clearing the session (spreadsheet import).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{DiveGroup, GroupLimits, Person};
use crate::section::resolve_section;

/// Everyone enrolled in a dive session, in enrollment order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Roster {
    pub session_id: String,
    pub people: Vec<Person>,
}

impl Roster {
    pub fn students(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|person| person.is_student())
    }

    pub fn supervisors(&self) -> impl Iterator<Item = &Person> {
        self.people.iter().filter(|person| person.is_supervisor())
    }

    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }
}

/// How the divers of a session should be split.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AssignmentRequest {
    /// Diver ID → supervisor ID.
    #[serde(default)]
    pub supervisor_assignments: BTreeMap<String, String>,
    /// Pod name → diver IDs of an unsupervised group.
    #[serde(default)]
    pub autonomous_pods: BTreeMap<String, Vec<String>>,
    /// Supervisor ID → limits of that supervisor's group.
    #[serde(default)]
    pub supervisor_limits: BTreeMap<String, GroupLimits>,
    /// Pod name → limits of that pod.
    #[serde(default)]
    pub pod_limits: BTreeMap<String, GroupLimits>,
    /// Diver ID → aptitude tag stored on the membership.
    #[serde(default)]
    pub aptitudes: BTreeMap<String, String>,
}

/// A non-fatal problem found while planning or parsing. Processing goes on.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignmentWarning {
    /// A student of the roster ended up in no group.
    Unassigned { diver_id: String },
    /// An ID in the request is not enrolled in the session.
    UnknownPerson { person_id: String },
    /// Someone placed as a diver is not a student.
    NotAStudent { person_id: String },
    /// Someone used as a group leader is not a supervisor.
    NotASupervisor { person_id: String },
    /// No member of the candidate group belongs to a training section.
    NoSection { group_name: String },
    /// A diver was placed a second time; the first placement is kept.
    DuplicateAssignment { diver_id: String, pod: String },
    /// A spreadsheet column header matches no enrolled supervisor.
    UnknownSupervisorName { name: String, column: usize },
    /// A spreadsheet row matches no enrolled student.
    UnknownDiverName { name: String, row: usize },
    /// A spreadsheet depth cell is not a number of meters.
    InvalidDepth { row: usize, value: String },
    /// A spreadsheet row carries several marks; the leftmost is kept.
    MultipleMarks { row: usize },
}

impl fmt::Display for AssignmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned { diver_id } => write!(f, "diver {diver_id} is not in any group"),
            Self::UnknownPerson { person_id } => {
                write!(f, "{person_id} is not enrolled in this session")
            }
            Self::NotAStudent { person_id } => write!(f, "{person_id} is not a student"),
            Self::NotASupervisor { person_id } => write!(f, "{person_id} is not a supervisor"),
            Self::NoSection { group_name } => write!(
                f,
                "group '{group_name}' skipped: no member belongs to a training section"
            ),
            Self::DuplicateAssignment { diver_id, pod } => {
                write!(f, "diver {diver_id} already placed, ignored in pod '{pod}'")
            }
            Self::UnknownSupervisorName { name, column } => {
                write!(f, "column {column}: unknown supervisor '{name}'")
            }
            Self::UnknownDiverName { name, row } => write!(f, "row {row}: unknown diver '{name}'"),
            Self::InvalidDepth { row, value } => write!(f, "row {row}: invalid depth '{value}'"),
            Self::MultipleMarks { row } => {
                write!(f, "row {row}: several supervisors marked, first one kept")
            }
        }
    }
}

/// A diver placed in a planned group.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PlannedMember {
    pub diver_id: String,
    pub aptitude: Option<String>,
}

/// A group whose section resolved, ready to be persisted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PlannedGroup {
    pub name: String,
    pub supervisor_id: Option<String>,
    pub section_id: String,
    pub limits: GroupLimits,
    pub members: Vec<PlannedMember>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AssignmentPlan {
    pub groups: Vec<PlannedGroup>,
    pub warnings: Vec<AssignmentWarning>,
}

/// Groups committed by an assignment or import, with the warnings collected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub groups: Vec<DiveGroup>,
    pub warnings: Vec<AssignmentWarning>,
}

/// Deterministic name of a supervised group.
#[must_use]
pub fn supervised_group_name(supervisor: &Person) -> String {
    format!("Palanquée {}", supervisor.full_name())
}

/// Deterministic name of an autonomous pod.
#[must_use]
pub fn pod_group_name(pod: &str) -> String {
    format!("Palanquée autonome {pod}")
}

/// Split `roster` into groups according to `request`.
///
/// Supervised groups come first, in roster order of their supervisor, then
/// pods in name order. Members keep roster order. A candidate group whose
/// members resolve no section is dropped with a warning; other groups are
/// unaffected. Students left out of every group are reported as
/// [`AssignmentWarning::Unassigned`].
#[must_use]
pub fn plan_groups(roster: &Roster, request: &AssignmentRequest) -> AssignmentPlan {
    let mut warnings = Vec::new();
    let mut placed: BTreeSet<&str> = BTreeSet::new();

    let supervisor_of = checked_supervisor_assignments(roster, request, &mut warnings);

    let mut supervised: Vec<(&Person, Vec<&Person>)> = roster
        .supervisors()
        .map(|supervisor| (supervisor, Vec::new()))
        .collect();
    for student in roster.students() {
        let Some(supervisor_id) = supervisor_of.get(student.id.as_str()) else {
            continue;
        };
        if let Some((_, members)) = supervised
            .iter_mut()
            .find(|(supervisor, _)| supervisor.id == *supervisor_id)
        {
            members.push(student);
            placed.insert(student.id.as_str());
        }
    }

    let mut candidates: Vec<Candidate<'_>> = supervised
        .into_iter()
        .filter(|(_, members)| !members.is_empty())
        .map(|(supervisor, members)| Candidate {
            name: supervised_group_name(supervisor),
            supervisor_id: Some(supervisor.id.clone()),
            limits: request
                .supervisor_limits
                .get(&supervisor.id)
                .copied()
                .unwrap_or_default(),
            members,
        })
        .collect();

    for (pod, diver_ids) in &request.autonomous_pods {
        let mut members = Vec::new();
        for diver_id in diver_ids {
            match roster.find(diver_id) {
                None => warnings.push(AssignmentWarning::UnknownPerson {
                    person_id: diver_id.clone(),
                }),
                Some(person) if !person.is_student() => {
                    warnings.push(AssignmentWarning::NotAStudent {
                        person_id: diver_id.clone(),
                    });
                }
                Some(person) => {
                    if placed.insert(person.id.as_str()) {
                        members.push(person);
                    } else {
                        warnings.push(AssignmentWarning::DuplicateAssignment {
                            diver_id: diver_id.clone(),
                            pod: pod.clone(),
                        });
                    }
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        candidates.push(Candidate {
            name: pod_group_name(pod),
            supervisor_id: None,
            limits: request.pod_limits.get(pod).copied().unwrap_or_default(),
            members,
        });
    }

    for student in roster.students() {
        if !placed.contains(student.id.as_str()) {
            warnings.push(AssignmentWarning::Unassigned {
                diver_id: student.id.clone(),
            });
        }
    }

    let mut groups = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match candidate.resolve(&request.aptitudes) {
            Some(group) => groups.push(group),
            None => warnings.push(AssignmentWarning::NoSection {
                group_name: candidate.name,
            }),
        }
    }

    AssignmentPlan { groups, warnings }
}

struct Candidate<'a> {
    name: String,
    supervisor_id: Option<String>,
    limits: GroupLimits,
    members: Vec<&'a Person>,
}

impl Candidate<'_> {
    fn resolve(&self, aptitudes: &BTreeMap<String, String>) -> Option<PlannedGroup> {
        let members: Vec<Person> = self.members.iter().map(|p| (*p).clone()).collect();
        let section_id = resolve_section(&members)?.to_string();
        Some(PlannedGroup {
            name: self.name.clone(),
            supervisor_id: self.supervisor_id.clone(),
            section_id,
            limits: self.limits,
            members: self
                .members
                .iter()
                .map(|member| PlannedMember {
                    diver_id: member.id.clone(),
                    aptitude: aptitudes
                        .get(&member.id)
                        .map(|tag| tag.trim().to_string())
                        .filter(|tag| !tag.is_empty()),
                })
                .collect(),
        })
    }
}

/// Keep only assignments whose diver is an enrolled student and whose leader
/// is an enrolled supervisor.
fn checked_supervisor_assignments<'r>(
    roster: &Roster,
    request: &'r AssignmentRequest,
    warnings: &mut Vec<AssignmentWarning>,
) -> HashMap<&'r str, &'r str> {
    let mut reported: BTreeSet<&str> = BTreeSet::new();
    let mut checked = HashMap::new();

    for (diver_id, supervisor_id) in &request.supervisor_assignments {
        match roster.find(diver_id) {
            None => {
                warnings.push(AssignmentWarning::UnknownPerson {
                    person_id: diver_id.clone(),
                });
                continue;
            }
            Some(person) if !person.is_student() => {
                warnings.push(AssignmentWarning::NotAStudent {
                    person_id: diver_id.clone(),
                });
                continue;
            }
            Some(_) => {}
        }

        let leader_ok = match roster.find(supervisor_id) {
            Some(person) if person.is_supervisor() => true,
            Some(_) => {
                if reported.insert(supervisor_id.as_str()) {
                    warnings.push(AssignmentWarning::NotASupervisor {
                        person_id: supervisor_id.clone(),
                    });
                }
                false
            }
            None => {
                if reported.insert(supervisor_id.as_str()) {
                    warnings.push(AssignmentWarning::UnknownPerson {
                        person_id: supervisor_id.clone(),
                    });
                }
                false
            }
        };
        if leader_ok {
            checked.insert(diver_id.as_str(), supervisor_id.as_str());
        }
    }

    checked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{Level, Role};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn person(id: &str, role: Role, level: Level, sections: &[&str]) -> Person {
        Person {
            id: id.into(),
            first_name: id.to_uppercase(),
            last_name: "Test".into(),
            email: None,
            role,
            level,
            section_ids: sections.iter().map(|s| (*s).to_string()).collect(),
            created_at: Utc::now(),
        }
    }

    fn roster() -> Roster {
        Roster {
            session_id: "ses-1".into(),
            people: vec![
                person("s1", Role::Student, Level::Niveau1, &["sec-n1"]),
                person("s2", Role::Student, Level::Niveau2, &["sec-n1"]),
                person("s3", Role::Student, Level::Niveau3, &["sec-n1"]),
                person("sup", Role::Supervisor, Level::Initiateur1, &[]),
            ],
        }
    }

    fn assign_all_to(supervisor: &str, divers: &[&str]) -> AssignmentRequest {
        AssignmentRequest {
            supervisor_assignments: divers
                .iter()
                .map(|d| ((*d).to_string(), supervisor.to_string()))
                .collect(),
            ..AssignmentRequest::default()
        }
    }

    #[test]
    fn one_supervisor_one_group() {
        let plan = plan_groups(&roster(), &assign_all_to("sup", &["s1", "s2", "s3"]));

        assert!(plan.warnings.is_empty(), "{:?}", plan.warnings);
        assert_eq!(plan.groups.len(), 1);
        let group = &plan.groups[0];
        assert_eq!(group.name, "Palanquée SUP Test");
        assert_eq!(group.supervisor_id.as_deref(), Some("sup"));
        assert_eq!(group.section_id, "sec-n1");
        let ids: Vec<&str> = group.members.iter().map(|m| m.diver_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn unassigned_divers_warn_without_blocking() {
        let plan = plan_groups(&roster(), &assign_all_to("sup", &["s1", "s2"]));

        assert_eq!(plan.groups.len(), 1);
        assert_eq!(
            plan.warnings,
            vec![AssignmentWarning::Unassigned {
                diver_id: "s3".into()
            }]
        );
    }

    #[test]
    fn group_without_section_is_skipped() {
        let mut roster = roster();
        for person in &mut roster.people {
            person.section_ids.clear();
        }
        let plan = plan_groups(&roster, &assign_all_to("sup", &["s1", "s2", "s3"]));

        assert!(plan.groups.is_empty());
        assert_eq!(
            plan.warnings,
            vec![AssignmentWarning::NoSection {
                group_name: "Palanquée SUP Test".into()
            }]
        );
    }

    #[test]
    fn pods_are_built_independently_of_supervisors() {
        let mut roster = roster();
        roster
            .people
            .push(person("sup2", Role::Supervisor, Level::Initiateur2, &[]));
        let request = AssignmentRequest {
            autonomous_pods: BTreeMap::from([(
                "A".to_string(),
                vec!["s2".to_string(), "s3".to_string()],
            )]),
            pod_limits: BTreeMap::from([(
                "A".to_string(),
                GroupLimits {
                    max_depth: Some(20),
                    max_duration: Some(45),
                },
            )]),
            ..assign_all_to("sup", &["s1"])
        };

        let plan = plan_groups(&roster, &request);
        assert!(plan.warnings.is_empty(), "{:?}", plan.warnings);
        assert_eq!(plan.groups.len(), 2);
        let pod = &plan.groups[1];
        assert_eq!(pod.name, "Palanquée autonome A");
        assert!(pod.supervisor_id.is_none());
        assert_eq!(pod.limits.max_depth, Some(20));
        assert_eq!(pod.members.len(), 2);
    }

    #[test]
    fn diver_placed_twice_keeps_first_placement() {
        let request = AssignmentRequest {
            autonomous_pods: BTreeMap::from([("A".to_string(), vec!["s1".to_string()])]),
            ..assign_all_to("sup", &["s1", "s2", "s3"])
        };
        let plan = plan_groups(&roster(), &request);

        assert_eq!(plan.groups.len(), 1);
        assert_eq!(
            plan.warnings,
            vec![AssignmentWarning::DuplicateAssignment {
                diver_id: "s1".into(),
                pod: "A".into()
            }]
        );
    }

    #[test]
    fn role_checks_reject_misplaced_people() {
        let request = AssignmentRequest {
            supervisor_assignments: BTreeMap::from([
                ("s1".to_string(), "s2".to_string()),
                ("sup".to_string(), "sup".to_string()),
                ("ghost".to_string(), "sup".to_string()),
            ]),
            ..AssignmentRequest::default()
        };
        let plan = plan_groups(&roster(), &request);

        assert!(plan.groups.is_empty());
        assert!(plan.warnings.contains(&AssignmentWarning::NotASupervisor {
            person_id: "s2".into()
        }));
        assert!(plan.warnings.contains(&AssignmentWarning::NotAStudent {
            person_id: "sup".into()
        }));
        assert!(plan.warnings.contains(&AssignmentWarning::UnknownPerson {
            person_id: "ghost".into()
        }));
    }

    #[test]
    fn aptitude_tags_are_trimmed_and_attached() {
        let request = AssignmentRequest {
            aptitudes: BTreeMap::from([
                ("s1".to_string(), " PE20 ".to_string()),
                ("s2".to_string(), "   ".to_string()),
            ]),
            ..assign_all_to("sup", &["s1", "s2", "s3"])
        };
        let plan = plan_groups(&roster(), &request);
        let members = &plan.groups[0].members;
        assert_eq!(members[0].aptitude.as_deref(), Some("PE20"));
        assert_eq!(members[1].aptitude, None);
    }

    #[test]
    fn warnings_render_for_humans() {
        let warning = AssignmentWarning::NoSection {
            group_name: "Palanquée X".into(),
        };
        assert_eq!(
            warning.to_string(),
            "group 'Palanquée X' skipped: no member belongs to a training section"
        );
    }
}
