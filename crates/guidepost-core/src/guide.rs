// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Local guide copies.

use std::ops::Deref;

use guidepost_proto::{Guide, GuideStep};

use crate::engagement::StepHandle;
use crate::url_pattern::UrlPattern;

/// A guide as held by the store: the server record plus compiled URL patterns.
///
/// Built the same way for fetched and socket-delivered guides.
#[derive(Debug, Clone)]
pub struct LocalGuide {
    guide: Guide,
    url_patterns: Vec<UrlPattern>,
}

impl LocalGuide {
    /// Build the local copy of a server guide.
    pub fn from_guide(guide: Guide) -> Self {
        let url_patterns = guide
            .activation_url_patterns
            .iter()
            .map(UrlPattern::compile)
            .collect();
        Self {
            guide,
            url_patterns,
        }
    }

    /// Server record.
    pub fn guide(&self) -> &Guide {
        &self.guide
    }

    /// Compiled `activation_url_patterns`, in source order.
    pub fn url_patterns(&self) -> &[UrlPattern] {
        &self.url_patterns
    }

    /// Step by reference.
    pub fn step(&self, step_ref: &str) -> Option<&GuideStep> {
        self.guide.steps.iter().find(|s| s.step_ref == step_ref)
    }

    pub(crate) fn step_mut(&mut self, step_ref: &str) -> Option<&mut GuideStep> {
        self.guide.steps.iter_mut().find(|s| s.step_ref == step_ref)
    }

    /// Engagement handles for every step, in step order.
    pub fn step_handles(&self) -> Vec<StepHandle> {
        self.guide
            .steps
            .iter()
            .map(|s| StepHandle::new(&self.guide.key, &s.step_ref))
            .collect()
    }

    /// Drop the compiled patterns and return the server record.
    pub fn into_guide(self) -> Guide {
        self.guide
    }
}

impl Deref for LocalGuide {
    type Target = Guide;

    fn deref(&self) -> &Guide {
        &self.guide
    }
}

impl From<Guide> for LocalGuide {
    fn from(guide: Guide) -> Self {
        Self::from_guide(guide)
    }
}
