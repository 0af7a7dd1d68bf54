//! Catalog: the static project showcase and its filter.
//!
//! DESIGN
//! ======
//! Stored projects carry a strict `Category`. The "All" choice on the
//! products page is a `CategoryFilter`, a separate selector type, so no
//! project can ever be stored under the pseudo-category.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Category of a stored project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Finance,
    Productivity,
    Education,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Finance, Self::Productivity, Self::Education];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Finance => "Finance",
            Self::Productivity => "Productivity",
            Self::Education => "Education",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category selector on the products page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    /// Selector choices in display order.
    #[must_use]
    pub fn choices() -> Vec<Self> {
        std::iter::once(Self::All)
            .chain(Category::ALL.into_iter().map(Self::Only))
            .collect()
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(category) => category.as_str(),
        }
    }

    #[must_use]
    pub fn matches(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    /// Unknown or empty selectors fall back to `All`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        Ok(Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
            .map_or(Self::All, Self::Only))
    }
}

/// A showcased work item. Compiled in; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: u32,
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub image: &'static str,
    pub link: &'static str,
    pub tags: &'static [&'static str],
}

pub static PROJECTS: [Project; 3] = [
    Project {
        id: 1,
        title: "ExpenseSplit",
        description: "A smart expense sharing app that helps groups track and settle bills effortlessly.",
        category: Category::Finance,
        image: "https://images.unsplash.com/photo-1554224155-8d04cb21cd6c?auto=format&fit=crop&q=80",
        link: "#",
        tags: &["React", "TypeScript", "Firebase"],
    },
    Project {
        id: 2,
        title: "AttendanceTracker",
        description: "Streamline attendance management with automated calculations and insights.",
        category: Category::Education,
        image: "https://images.unsplash.com/photo-1552664730-d307ca884978?auto=format&fit=crop&q=80",
        link: "https://attendando-genius.netlify.app/",
        tags: &["React", "Node.js", "MongoDB"],
    },
    Project {
        id: 3,
        title: "TaskMaster",
        description: "Boost productivity with this intuitive task management and scheduling tool.",
        category: Category::Productivity,
        image: "https://images.unsplash.com/photo-1484480974693-6ca0a78fb36b?auto=format&fit=crop&q=80",
        link: "#",
        tags: &["React", "Redux", "Material-UI"],
    },
];

/// Number of projects shown on the home page.
pub const FEATURED_COUNT: usize = 3;

/// A project matches when `query` is a case-insensitive substring of its
/// title or description, and `filter` admits its category.
#[must_use]
pub fn matches(project: &Project, query: &str, filter: CategoryFilter) -> bool {
    let needle = query.to_lowercase();
    let text_match = project.title.to_lowercase().contains(&needle)
        || project.description.to_lowercase().contains(&needle);
    text_match && filter.matches(project.category)
}

#[must_use]
pub fn filter_projects(query: &str, filter: CategoryFilter) -> Vec<&'static Project> {
    PROJECTS
        .iter()
        .filter(|project| matches(project, query, filter))
        .collect()
}

#[must_use]
pub fn featured() -> &'static [Project] {
    &PROJECTS[..FEATURED_COUNT.min(PROJECTS.len())]
}

// =============================================================================
// HOME PAGE COPY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

pub static FEATURES: [Feature; 4] = [
    Feature {
        title: "Modern Tech Stack",
        description: "Built with Rust, axum, and a hosted Postgres backend for real-time capabilities.",
    },
    Feature {
        title: "Lightning Fast",
        description: "Optimized performance with efficient data loading and caching.",
    },
    Feature {
        title: "Secure by Design",
        description: "Enterprise-grade security with Row Level Security and authentication.",
    },
    Feature {
        title: "Collaborative",
        description: "Real-time updates and seamless team collaboration features.",
    },
];

pub static STATS: [(&str, &str); 3] = [
    ("1000+", "Active Users"),
    ("5000+", "Projects Showcased"),
    ("50+", "Countries Reached"),
];

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
