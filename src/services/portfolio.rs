use std::{collections::BTreeMap, fmt::Write as _, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SAMPLE_PORTFOLIO: &str = include_str!("../../data/portfolio.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portfolio {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub tagline: String,
    pub location: String,
    pub contact: Contact,
    pub about: String,
    /// Category name -> skills. Ordered so the prompt is stable.
    #[serde(default)]
    pub skills: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    pub education: Education,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub publications: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub email: String,
    pub linkedin: String,
    #[serde(default)]
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub achievement: String,
    #[serde(default)]
    pub impact: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub major: String,
    pub institution: String,
    pub duration: String,
}

impl Portfolio {
    pub fn sample() -> Result<Self> {
        serde_json::from_str(SAMPLE_PORTFOLIO).context("embedded sample portfolio is malformed")
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read portfolio file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse portfolio file {}", path.display()))
    }

    /// Upper-case first letters of the first and last name, e.g. "AM".
    pub fn initials(&self) -> String {
        let words: Vec<&str> = self.name.split_whitespace().collect();
        let picked = match words.as_slice() {
            [] => return "AI".to_string(),
            [only] => vec![*only],
            [first, .., last] => vec![*first, *last],
        };
        picked
            .iter()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// System prompt handed to the model ahead of every conversation.
    pub fn system_prompt(&self) -> String {
        let mut p = String::new();
        let _ = writeln!(
            p,
            "You are an intelligent AI assistant representing {}, {}.",
            self.name, self.role
        );
        p.push_str("\nPORTFOLIO INFORMATION:\n======================\n\n");
        let _ = writeln!(p, "NAME: {}", self.name);
        let _ = writeln!(p, "ROLE: {}", self.role);
        let _ = writeln!(p, "LOCATION: {}", self.location);
        let _ = writeln!(p, "\nABOUT:\n{}", self.about);
        let _ = writeln!(
            p,
            "\nCONTACT:\n- Email: {}\n- LinkedIn: {}",
            self.contact.email, self.contact.linkedin
        );

        p.push_str("\nSKILLS:\n");
        for (category, skills) in &self.skills {
            let _ = writeln!(p, "- {}: {}", title_case(category), skills.join(", "));
        }

        p.push_str("\nEXPERIENCE:\n");
        for (i, job) in self.experience.iter().enumerate() {
            let _ = writeln!(p, "{}. {} at {} ({})", i + 1, job.title, job.company, job.duration);
            for line in &job.description {
                let _ = writeln!(p, "   - {line}");
            }
        }

        p.push_str("\nKEY PROJECTS:\n");
        for (i, project) in self.projects.iter().enumerate() {
            let _ = writeln!(p, "{}. {}: {}", i + 1, project.name, project.description);
            if !project.achievement.is_empty() {
                let _ = writeln!(p, "   - {}", project.achievement);
            }
        }

        let _ = writeln!(
            p,
            "\nEDUCATION:\n{} in {}\n{} ({})",
            self.education.degree,
            self.education.major,
            self.education.institution,
            self.education.duration
        );
        if !self.certifications.is_empty() {
            let _ = writeln!(p, "\nCERTIFICATIONS:\n{}", self.certifications.join(", "));
        }
        if !self.publications.is_empty() {
            let _ = writeln!(p, "\nPUBLICATIONS:\n{}", self.publications.join("; "));
        }

        let first = self.first_name();
        let _ = write!(
            p,
            "\nBEHAVIOR GUIDELINES:\n====================\n\
             1. Be professional, confident, and polite\n\
             2. Answer questions clearly and concisely\n\
             3. Explain projects in simple terms that non-technical people can understand\n\
             4. When asked about skills, mention specific technologies and real projects\n\
             5. When asked about experience, highlight achievements and learning outcomes\n\
             6. Encourage contact naturally without being pushy\n\
             7. NEVER make up information that is not in the portfolio\n\
             8. If asked about something not in the portfolio, politely say you don't have that information\n\
             9. Use first-person when describing {first}'s work\n\
             10. If asked unrelated questions, politely redirect to portfolio topics\n\
             \nRemember: You represent {}. Keep responses focused, accurate, and engaging!",
            self.name
        );
        p
    }
}

fn title_case(key: &str) -> String {
    match key {
        "ml_libraries" => "ML Libraries".to_string(),
        "ai_ml" => "AI/ML".to_string(),
        other => other
            .split('_')
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(c) => c.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}
