//! The persisted resume document shape. Built fresh per job by the
//! assembler; downstream editing (reorder/hide) happens outside this core.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Education,
    Experience,
    Skills,
    Projects,
}

/// One entry in the document's ordered section list. `visible` and `order`
/// drive rendering; the renderer itself is an external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRef {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub visible: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeBullet {
    pub bullet_id: Uuid,
    pub text: String,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeExperience {
    pub id: Uuid,
    pub company: String,
    pub role: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub bullets: Vec<ResumeBullet>,
    pub visible: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeProject {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub bullets: Vec<ResumeBullet>,
    pub visible: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeEducation {
    pub id: Uuid,
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub visible: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeSkillCategory {
    pub id: Uuid,
    pub name: String,
    pub skills: Vec<String>,
    pub visible: bool,
    pub order: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeContact {
    pub full_name: String,
    pub email: String,
    pub headline: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeDocument {
    pub user: ResumeContact,
    pub section_order: Vec<SectionRef>,
    pub education: Vec<ResumeEducation>,
    pub experiences: Vec<ResumeExperience>,
    pub skill_categories: Vec<ResumeSkillCategory>,
    pub projects: Vec<ResumeProject>,
}
