//! Term service
//!
//! Terms, their taxonomy entries, and the relationships that attach taxonomy
//! entries to posts.

use tracing::debug;

use crate::error::RecordError;
use crate::models::{Post, Term, TermRelationship, TermTaxonomy};
use crate::services::Repositories;
use crate::validation::{presence, presence_of_id, run_checks, Check, FieldError};

fn name_present(term: &Term) -> Option<FieldError> {
    presence("name", &term.name)
}

fn slug_present(term: &Term) -> Option<FieldError> {
    presence("slug", &term.slug)
}

fn term_id_present(entry: &TermTaxonomy) -> Option<FieldError> {
    presence_of_id("term_id", entry.term_id)
}

fn taxonomy_present(entry: &TermTaxonomy) -> Option<FieldError> {
    presence("taxonomy", &entry.taxonomy)
}

pub const TERM_CHECKS: &[Check<Term>] = &[name_present, slug_present];

pub const TAXONOMY_CHECKS: &[Check<TermTaxonomy>] = &[term_id_present, taxonomy_present];

/// Term service
pub struct TermService {
    repos: Repositories,
}

impl TermService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Insert (id 0) or update a term
    pub async fn save_term(&self, term: Term) -> Result<Term, RecordError> {
        run_checks(&term, TERM_CHECKS).into_result()?;

        let saved = if term.term_id == 0 {
            self.repos.terms.create(&term).await?
        } else {
            self.find_term(term.term_id).await?;
            self.repos.terms.update(&term).await?
        };
        debug!(term_id = saved.term_id, slug = %saved.slug, "Term saved");
        Ok(saved)
    }

    /// Insert (id 0) or update a taxonomy entry
    pub async fn save_taxonomy(&self, entry: TermTaxonomy) -> Result<TermTaxonomy, RecordError> {
        run_checks(&entry, TAXONOMY_CHECKS).into_result()?;

        let saved = if entry.term_taxonomy_id == 0 {
            self.repos.term_taxonomies.create(&entry).await?
        } else {
            let id = entry.term_taxonomy_id;
            self.repos
                .term_taxonomies
                .get_by_id(id)
                .await?
                .ok_or(RecordError::NotFound { entity: "TermTaxonomy", id })?;
            self.repos.term_taxonomies.update(&entry).await?
        };
        debug!(
            term_taxonomy_id = saved.term_taxonomy_id,
            taxonomy = %saved.taxonomy,
            "Taxonomy entry saved"
        );
        Ok(saved)
    }

    pub async fn find_term(&self, id: i64) -> Result<Term, RecordError> {
        self.repos
            .terms
            .get_by_id(id)
            .await?
            .ok_or(RecordError::NotFound { entity: "Term", id })
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Term>, RecordError> {
        Ok(self.repos.terms.get_by_slug(slug).await?)
    }

    /// Delete a term; its taxonomy entries and relationships stay
    pub async fn delete_term(&self, id: i64) -> Result<bool, RecordError> {
        Ok(self.repos.terms.delete(id).await?)
    }

    /// Taxonomy entries of a term
    pub async fn taxonomies(&self, term_id: i64) -> Result<Vec<TermTaxonomy>, RecordError> {
        Ok(self.repos.term_taxonomies.list_by_term(term_id).await?)
    }

    /// Relationships of every taxonomy entry of a term
    pub async fn relationships(&self, term_id: i64) -> Result<Vec<TermRelationship>, RecordError> {
        Ok(self.repos.term_relationships.list_by_term(term_id).await?)
    }

    /// Distinct posts reachable through any taxonomy entry of the term
    pub async fn posts(&self, term_id: i64) -> Result<Vec<Post>, RecordError> {
        Ok(self.repos.posts.list_by_term(term_id).await?)
    }

    /// Attach a taxonomy entry to a post; attaching twice is a no-op
    pub async fn tag_post(
        &self,
        post_id: i64,
        term_taxonomy_id: i64,
    ) -> Result<TermRelationship, RecordError> {
        if self.repos.posts.get_by_id(post_id).await?.is_none() {
            return Err(RecordError::NotFound { entity: "Post", id: post_id });
        }
        if self
            .repos
            .term_taxonomies
            .get_by_id(term_taxonomy_id)
            .await?
            .is_none()
        {
            return Err(RecordError::NotFound {
                entity: "TermTaxonomy",
                id: term_taxonomy_id,
            });
        }

        let relationship = self
            .repos
            .term_relationships
            .add(post_id, term_taxonomy_id, 0)
            .await?;
        debug!(post_id, term_taxonomy_id, "Post tagged");
        Ok(relationship)
    }

    pub async fn untag_post(&self, post_id: i64, term_taxonomy_id: i64) -> Result<bool, RecordError> {
        Ok(self
            .repos
            .term_relationships
            .remove(post_id, term_taxonomy_id)
            .await?)
    }
}
