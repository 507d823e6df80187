//! Qualifications editing: company background, team, experience and testimonials.

use crate::error::{ProposalError, ProposalResult};
use crate::models::{set_text, QualificationsSection, TeamMember, Testimonial};

fn required(value: &str, what: &str) -> ProposalResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProposalError::rejected(format!("{} is required", what)));
    }
    Ok(trimmed.to_string())
}

impl QualificationsSection {
    pub fn set_company_background(&mut self, text: &str) -> bool {
        set_text(&mut self.company_background, text)
    }

    /// Adds a team member; name and role are required, the bio is optional
    pub fn add_team_member(&mut self, name: &str, role: &str, bio: &str) -> ProposalResult<usize> {
        let member = TeamMember {
            name: required(name, "team member name")?,
            role: required(role, "team member role")?,
            bio: bio.trim().to_string(),
        };
        self.team_members.push(member);
        Ok(self.team_members.len() - 1)
    }

    pub fn remove_team_member(&mut self, index: usize) -> ProposalResult<TeamMember> {
        ProposalError::check_index(index, self.team_members.len())?;
        Ok(self.team_members.remove(index))
    }

    pub fn add_experience(&mut self, entry: &str) -> ProposalResult<usize> {
        self.relevant_experience.push(required(entry, "experience entry")?);
        Ok(self.relevant_experience.len() - 1)
    }

    pub fn remove_experience(&mut self, index: usize) -> ProposalResult<String> {
        ProposalError::check_index(index, self.relevant_experience.len())?;
        Ok(self.relevant_experience.remove(index))
    }

    /// Adds a testimonial; a blank company is stored as absent
    pub fn add_testimonial(&mut self, quote: &str, author: &str, company: Option<&str>) -> ProposalResult<usize> {
        let testimonial = Testimonial {
            quote: required(quote, "testimonial quote")?,
            author: required(author, "testimonial author")?,
            company: company
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };
        self.testimonials.push(testimonial);
        Ok(self.testimonials.len() - 1)
    }

    pub fn remove_testimonial(&mut self, index: usize) -> ProposalResult<Testimonial> {
        ProposalError::check_index(index, self.testimonials.len())?;
        Ok(self.testimonials.remove(index))
    }
}

impl Testimonial {
    /// `Author, Company` or just the author
    pub fn attribution(&self) -> String {
        match &self.company {
            Some(company) => format!("{}, {}", self.author, company),
            None => self.author.clone(),
        }
    }
}
