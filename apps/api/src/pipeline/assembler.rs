//! Resume assembly: folds selected/verified bullets back onto the user's
//! structured profile and produces the persisted resume document.
//!
//! Experiences and projects appear only if they contributed a selected
//! bullet; education and skill categories are carried through in full since
//! they have no bullet-level granularity.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::bullet::{BulletCandidate, ParentType};
use crate::models::profile::UserProfile;
use crate::models::resume::{
    ResumeBullet, ResumeContact, ResumeDocument, ResumeEducation, ResumeExperience, ResumeProject,
    ResumeSkillCategory, SectionRef, SectionType,
};

/// Builds the resume document from the profile and the selected bullets.
///
/// `final_texts` maps bullet id to its post-verification text; a bullet with
/// no entry falls back to its retrieved content (the bm25 strategy never
/// rewrites, so the map is empty there).
pub fn assemble_resume(
    profile: &UserProfile,
    selected: &[BulletCandidate],
    final_texts: &HashMap<Uuid, String>,
) -> ResumeDocument {
    let mut by_parent: HashMap<Uuid, Vec<&BulletCandidate>> = HashMap::new();
    for bullet in selected {
        by_parent.entry(bullet.parent_id).or_default().push(bullet);
    }

    let experiences: Vec<ResumeExperience> = profile
        .experiences
        .iter()
        .filter_map(|exp| {
            let bullets = section_bullets(&by_parent, exp.id, ParentType::Experience, final_texts)?;
            Some((exp, bullets))
        })
        .enumerate()
        .map(|(order, (exp, bullets))| ResumeExperience {
            id: exp.id,
            company: exp.company.clone(),
            role: exp.role.clone(),
            location: exp.location.clone(),
            start_date: exp.start_date.clone(),
            end_date: exp.end_date.clone(),
            bullets,
            visible: true,
            order: order as i32,
        })
        .collect();

    let projects: Vec<ResumeProject> = profile
        .projects
        .iter()
        .filter_map(|project| {
            let bullets = section_bullets(&by_parent, project.id, ParentType::Project, final_texts)?;
            Some((project, bullets))
        })
        .enumerate()
        .map(|(order, (project, bullets))| ResumeProject {
            id: project.id,
            name: project.name.clone(),
            description: project.description.clone(),
            url: project.url.clone(),
            bullets,
            visible: true,
            order: order as i32,
        })
        .collect();

    let education: Vec<ResumeEducation> = profile
        .education
        .iter()
        .enumerate()
        .map(|(order, edu)| ResumeEducation {
            id: edu.id,
            institution: edu.institution.clone(),
            degree: edu.degree.clone(),
            field: edu.field.clone(),
            start_date: edu.start_date.clone(),
            end_date: edu.end_date.clone(),
            visible: true,
            order: order as i32,
        })
        .collect();

    let skill_categories: Vec<ResumeSkillCategory> = profile
        .skill_categories
        .iter()
        .enumerate()
        .map(|(order, category)| ResumeSkillCategory {
            id: category.id,
            name: category.name.clone(),
            skills: category.skills.clone(),
            visible: true,
            order: order as i32,
        })
        .collect();

    ResumeDocument {
        user: ResumeContact {
            full_name: profile.user.full_name.clone(),
            email: profile.user.email.clone(),
            headline: profile.user.headline.clone(),
            location: profile.user.location.clone(),
        },
        section_order: default_section_order(),
        education,
        experiences,
        skill_categories,
        projects,
    }
}

/// Bullets for one parent, sorted by score descending with zero-based order.
/// Returns `None` when the parent contributed nothing; it is then omitted
/// from the assembled resume entirely.
fn section_bullets(
    by_parent: &HashMap<Uuid, Vec<&BulletCandidate>>,
    parent_id: Uuid,
    parent_type: ParentType,
    final_texts: &HashMap<Uuid, String>,
) -> Option<Vec<ResumeBullet>> {
    let mut bullets: Vec<&BulletCandidate> = by_parent
        .get(&parent_id)?
        .iter()
        .filter(|b| b.parent_type == parent_type)
        .copied()
        .collect();
    if bullets.is_empty() {
        return None;
    }
    bullets.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Some(
        bullets
            .into_iter()
            .enumerate()
            .map(|(order, bullet)| ResumeBullet {
                bullet_id: bullet.bullet_id,
                text: final_texts
                    .get(&bullet.bullet_id)
                    .cloned()
                    .unwrap_or_else(|| bullet.content.clone()),
                order: order as i32,
            })
            .collect(),
    )
}

/// Fixed output section order: education, experience, skills, projects.
fn default_section_order() -> Vec<SectionRef> {
    [
        ("education", SectionType::Education),
        ("experience", SectionType::Experience),
        ("skills", SectionType::Skills),
        ("projects", SectionType::Projects),
    ]
    .into_iter()
    .enumerate()
    .map(|(order, (id, section_type))| SectionRef {
        id: id.to_string(),
        section_type,
        visible: true,
        order: order as i32,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{
        EducationRow, ExperienceRow, ProjectRow, SkillCategoryRow, User,
    };
    use chrono::Utc;

    fn make_profile(experience_ids: &[Uuid], project_ids: &[Uuid]) -> UserProfile {
        let user_id = Uuid::new_v4();
        UserProfile {
            user: User {
                id: user_id,
                external_id: "ext-1".to_string(),
                email: "ada@example.com".to_string(),
                full_name: "Ada Lovelace".to_string(),
                headline: Some("Engineer".to_string()),
                location: None,
                created_at: Utc::now(),
            },
            experiences: experience_ids
                .iter()
                .map(|&id| ExperienceRow {
                    id,
                    user_id,
                    company: format!("Company {id}"),
                    role: "Engineer".to_string(),
                    location: None,
                    start_date: Some("2021-01-01".to_string()),
                    end_date: None,
                    created_at: Utc::now(),
                })
                .collect(),
            projects: project_ids
                .iter()
                .map(|&id| ProjectRow {
                    id,
                    user_id,
                    name: format!("Project {id}"),
                    description: None,
                    url: None,
                    start_date: None,
                    end_date: None,
                    created_at: Utc::now(),
                })
                .collect(),
            education: vec![EducationRow {
                id: Uuid::new_v4(),
                user_id,
                institution: "University of London".to_string(),
                degree: "BSc".to_string(),
                field: Some("Mathematics".to_string()),
                start_date: None,
                end_date: Some("1840-06-01".to_string()),
                created_at: Utc::now(),
            }],
            skill_categories: vec![SkillCategoryRow {
                id: Uuid::new_v4(),
                user_id,
                name: "Languages".to_string(),
                skills: vec!["Rust".to_string(), "SQL".to_string()],
                created_at: Utc::now(),
            }],
        }
    }

    fn make_selected(parent_id: Uuid, parent_type: ParentType, score: f64) -> BulletCandidate {
        BulletCandidate {
            bullet_id: Uuid::new_v4(),
            content: format!("Did a thing scored {score}"),
            score,
            parent_id,
            parent_type,
            start_date: None,
            end_date: None,
            tags: vec![],
            skills: vec![],
        }
    }

    #[test]
    fn test_experience_without_bullets_omitted() {
        let with_bullets = Uuid::new_v4();
        let without = Uuid::new_v4();
        let profile = make_profile(&[with_bullets, without], &[]);
        let selected = vec![make_selected(with_bullets, ParentType::Experience, 5.0)];
        let resume = assemble_resume(&profile, &selected, &HashMap::new());
        assert_eq!(resume.experiences.len(), 1);
        assert_eq!(resume.experiences[0].id, with_bullets);
    }

    #[test]
    fn test_bullets_sorted_by_score_with_zero_based_order() {
        let parent = Uuid::new_v4();
        let profile = make_profile(&[parent], &[]);
        let low = make_selected(parent, ParentType::Experience, 1.0);
        let high = make_selected(parent, ParentType::Experience, 9.0);
        let resume = assemble_resume(&profile, &[low.clone(), high.clone()], &HashMap::new());
        let bullets = &resume.experiences[0].bullets;
        assert_eq!(bullets[0].bullet_id, high.bullet_id);
        assert_eq!(bullets[0].order, 0);
        assert_eq!(bullets[1].bullet_id, low.bullet_id);
        assert_eq!(bullets[1].order, 1);
    }

    #[test]
    fn test_final_text_overrides_retrieved_content() {
        let parent = Uuid::new_v4();
        let profile = make_profile(&[parent], &[]);
        let bullet = make_selected(parent, ParentType::Experience, 5.0);
        let mut texts = HashMap::new();
        texts.insert(bullet.bullet_id, "Verified rewrite".to_string());
        let resume = assemble_resume(&profile, &[bullet], &texts);
        assert_eq!(resume.experiences[0].bullets[0].text, "Verified rewrite");
    }

    #[test]
    fn test_education_and_skills_carried_in_full() {
        let profile = make_profile(&[], &[]);
        let resume = assemble_resume(&profile, &[], &HashMap::new());
        assert_eq!(resume.education.len(), 1);
        assert_eq!(resume.skill_categories.len(), 1);
        assert!(resume.education[0].visible);
        assert_eq!(resume.education[0].order, 0);
        assert_eq!(resume.skill_categories[0].order, 0);
    }

    #[test]
    fn test_projects_filtered_like_experiences() {
        let with_bullets = Uuid::new_v4();
        let without = Uuid::new_v4();
        let profile = make_profile(&[], &[with_bullets, without]);
        let selected = vec![make_selected(with_bullets, ParentType::Project, 3.0)];
        let resume = assemble_resume(&profile, &selected, &HashMap::new());
        assert_eq!(resume.projects.len(), 1);
        assert_eq!(resume.projects[0].id, with_bullets);
    }

    #[test]
    fn test_section_order_is_fixed() {
        let profile = make_profile(&[], &[]);
        let resume = assemble_resume(&profile, &[], &HashMap::new());
        let types: Vec<_> = resume
            .section_order
            .iter()
            .map(|s| s.section_type)
            .collect();
        assert_eq!(
            types,
            vec![
                SectionType::Education,
                SectionType::Experience,
                SectionType::Skills,
                SectionType::Projects,
            ]
        );
        assert!(resume.section_order.iter().all(|s| s.visible));
        let orders: Vec<_> = resume.section_order.iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }
}
