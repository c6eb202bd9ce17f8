use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Result, SharePushError};
use crate::node::{Graph, NodeId};
use crate::records::{Record, RecordStore, AWARDS, CONTRIBUTORS, FUNDERS, WORKS};

pub mod kind {
    pub const WORK_IDENTIFIER: &str = "workidentifier";
    pub const AGENT_IDENTIFIER: &str = "agentidentifier";
    pub const TAG: &str = "tag";
    pub const THROUGH_TAGS: &str = "throughtags";
    pub const CREATOR: &str = "creator";
    pub const CONTRIBUTOR: &str = "contributor";
    pub const FUNDER: &str = "funder";
    pub const AWARD: &str = "award";
    pub const THROUGH_AWARDS: &str = "throughawards";
    pub const INSTITUTION: &str = "institution";
    pub const DEPARTMENT: &str = "department";
    pub const IS_AFFILIATED_WITH: &str = "isaffiliatedwith";
    pub const WORK_RELATION: &str = "workrelation";
    pub const CREATIVE_WORK: &str = "creativework";
    pub const PERSON: &str = "person";
    pub const ORGANIZATION: &str = "organization";
}

/// Column holding the remote identifier of a record that already exists
/// upstream and should be updated rather than created.
pub const STABLE_ID_COLUMN: &str = "share_id";

/// A formatted work: the arena, the work node and the roots to flatten from.
#[derive(Debug, Clone)]
pub struct WorkGraph {
    pub key: String,
    pub graph: Graph,
    pub work: NodeId,
}

/// How an agent is credited on a work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    /// Bibliographic author, cited at a zero-based position.
    Creator { order: usize },
    /// Non-bibliographic contributor; carries no citation order.
    Contributor,
}

/// Build the complete graph for the work keyed `key` in the `works`
/// collection. Any unresolved contributor, funder or award id aborts.
pub fn format_work(store: &RecordStore, key: &str) -> Result<WorkGraph> {
    let works = store.require_collection(WORKS)?;
    let record = works.get(key).ok_or_else(|| SharePushError::LookupFailed {
        collection: WORKS.to_string(),
        key: key.to_string(),
        work: key.to_string(),
    })?;

    let mut graph = Graph::new();
    let work = format_creative_work(&mut graph, record)?;
    graph.add_root(work);

    let mut uris: Vec<&str> = Vec::new();
    if let Some(url) = record.non_empty("url") {
        uris.push(url);
    }
    uris.extend(record.multi("identifiers"));
    for uri in uris {
        let identifier = format_work_identifier(&mut graph, work, uri);
        graph.add_root(identifier);
    }

    graph.ensure_seq(work, "tags");
    for tag in record.multi("tags") {
        let through = format_tag(&mut graph, work, tag);
        graph.push(work, "tags", through);
    }

    graph.ensure_seq(work, "agent_relations");
    for (order, agent_key) in record.multi("contributors").into_iter().enumerate() {
        let agent = store.resolve(CONTRIBUTORS, agent_key, key)?;
        let edge = format_contributor(&mut graph, work, agent, Contribution::Creator { order });
        graph.push(work, "agent_relations", edge);
    }
    for agent_key in record.multi("non_bibliographic_contributors") {
        let agent = store.resolve(CONTRIBUTORS, agent_key, key)?;
        let edge = format_contributor(&mut graph, work, agent, Contribution::Contributor);
        graph.push(work, "agent_relations", edge);
    }

    for funder_key in record.multi("funders") {
        let funder = store.resolve(FUNDERS, funder_key, key)?;
        let edge = format_funder(&mut graph, store, work, key, funder)?;
        graph.push(work, "agent_relations", edge);
    }

    for identifier in record.multi("related_works") {
        let relation = format_related_work(&mut graph, work, identifier);
        graph.add_root(relation);
    }

    debug!(work = %key, nodes = graph.len(), "Formatted work graph");
    Ok(WorkGraph {
        key: key.to_string(),
        graph,
        work,
    })
}

/// The work node itself: `type`, `title` and `description` columns are
/// required; dates and the deletion flag are optional.
pub fn format_creative_work(graph: &mut Graph, record: &Record) -> Result<NodeId> {
    let work_type = record.require("type")?.trim();
    if work_type.is_empty() {
        return Err(SharePushError::InvalidField {
            field: "type".into(),
            value: String::new(),
            reason: "work type must not be empty".into(),
        });
    }
    let title = record.require("title")?.trim();
    let description = record.require("description")?.trim();

    let work = graph.add_maybe_stable(record.non_empty(STABLE_ID_COLUMN), work_type);
    graph.set_opt(work, "title", Some(title));
    graph.set_opt(work, "description", Some(description));

    let is_deleted = match record.non_empty("is_deleted") {
        Some(raw) => parse_bool("is_deleted", raw)?,
        None => false,
    };
    graph.set(work, "is_deleted", is_deleted);

    for column in ["date_published", "date_updated"] {
        if let Some(raw) = record.non_empty(column) {
            graph.set(work, column, parse_date(column, raw)?);
        }
    }

    Ok(work)
}

pub fn format_work_identifier(graph: &mut Graph, work: NodeId, uri: &str) -> NodeId {
    let identifier = graph.add(kind::WORK_IDENTIFIER);
    graph.set(identifier, "uri", uri);
    graph.link(identifier, "creative_work", work);
    identifier
}

/// A `tag` wrapped in its `throughtags` join to the work.
pub fn format_tag(graph: &mut Graph, work: NodeId, name: &str) -> NodeId {
    let tag = graph.add(kind::TAG);
    graph.set(tag, "name", name);

    let through = graph.add(kind::THROUGH_TAGS);
    graph.link(through, "creative_work", work);
    graph.link(through, "tag", tag);
    through
}

/// Creator or contributor edge between the work and a freshly formatted agent.
pub fn format_contributor(
    graph: &mut Graph,
    work: NodeId,
    agent_record: &Record,
    contribution: Contribution,
) -> NodeId {
    let agent = format_agent(graph, agent_record, kind::PERSON);
    let edge_kind = match contribution {
        Contribution::Creator { .. } => kind::CREATOR,
        Contribution::Contributor => kind::CONTRIBUTOR,
    };

    let edge = graph.add(edge_kind);
    graph.link(edge, "agent", agent);
    graph.link(edge, "creative_work", work);
    graph.set_opt(edge, "cited_as", agent_record.non_empty("name"));
    if let Contribution::Creator { order } = contribution {
        graph.set(edge, "order_cited", order as i64);
    }
    edge
}

/// An agent (person, institution, organization...) with its identifiers and
/// affiliations. `default_kind` applies when the row has no `type`.
pub fn format_agent(graph: &mut Graph, record: &Record, default_kind: &str) -> NodeId {
    let agent_kind = record.non_empty("type").unwrap_or(default_kind);
    let agent = graph.add_maybe_stable(record.non_empty(STABLE_ID_COLUMN), agent_kind);
    graph.set_opt(agent, "name", record.non_empty("name"));

    let mut identifiers: Vec<&str> = record.multi("identifiers");
    if let Some(email) = record.non_empty("email") {
        identifiers.push(email);
    }
    for raw in identifiers {
        let identifier = format_agent_identifier(graph, agent, raw);
        graph.push(agent, "identifiers", identifier);
    }

    format_affiliations(graph, agent, record);
    agent
}

pub fn format_agent_identifier(graph: &mut Graph, agent: NodeId, raw: &str) -> NodeId {
    let identifier = graph.add(kind::AGENT_IDENTIFIER);
    graph.set(identifier, "uri", contact_uri(raw));
    graph.link(identifier, "agent", agent);
    identifier
}

/// Bare e-mail addresses become `mailto:` URIs; anything else is kept.
pub fn contact_uri(raw: &str) -> String {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("mailto:") || raw.contains("://") || !raw.contains('@') {
        raw.to_string()
    } else {
        format!("mailto:{raw}")
    }
}

/// Wire `affiliation` and `department` columns as `isaffiliatedwith` joins.
///
/// Each affiliation yields an institution. Departments are paired with every
/// institution (Cartesian product): one department node and one join per
/// pair, the department pointing at its institution. Without affiliations
/// each department stands alone.
pub fn format_affiliations(graph: &mut Graph, agent: NodeId, record: &Record) {
    let departments = record.multi("department");

    let mut institutions = Vec::new();
    for name in record.multi("affiliation") {
        let institution = graph.add(kind::INSTITUTION);
        graph.set(institution, "name", name);
        affiliate(graph, agent, institution);
        institutions.push(institution);
    }

    if institutions.is_empty() {
        for name in departments {
            let department = format_department(graph, name, None);
            affiliate(graph, agent, department);
        }
        return;
    }

    for &institution in &institutions {
        for &name in &departments {
            let department = format_department(graph, name, Some(institution));
            affiliate(graph, agent, department);
        }
    }
}

pub fn format_department(graph: &mut Graph, name: &str, institution: Option<NodeId>) -> NodeId {
    let department = graph.add(kind::DEPARTMENT);
    graph.set(department, "name", name);
    if let Some(institution) = institution {
        graph.link(department, "institution", institution);
    }
    department
}

fn affiliate(graph: &mut Graph, agent: NodeId, related: NodeId) -> NodeId {
    let join = graph.add(kind::IS_AFFILIATED_WITH);
    graph.link(join, "subject", agent);
    graph.link(join, "related", related);
    graph.push(agent, "related_agents", join);
    join
}

/// Funder edge for `funder_record`, with each of its awards resolved from
/// the `awards` collection and attached through a `throughawards` join.
pub fn format_funder(
    graph: &mut Graph,
    store: &RecordStore,
    work: NodeId,
    work_key: &str,
    funder_record: &Record,
) -> Result<NodeId> {
    let agent = format_agent(graph, funder_record, kind::ORGANIZATION);

    let funder = graph.add(kind::FUNDER);
    graph.link(funder, "agent", agent);
    graph.link(funder, "creative_work", work);
    graph.set_opt(funder, "cited_as", funder_record.non_empty("name"));

    for award_key in funder_record.multi("awards") {
        let award_record = store.resolve(AWARDS, award_key, work_key)?;
        let award = format_award(graph, award_record)?;

        let through = graph.add(kind::THROUGH_AWARDS);
        graph.link(through, "funder", funder);
        graph.link(through, "award", award);
        graph.push(funder, "awards", through);
    }

    Ok(funder)
}

pub fn format_award(graph: &mut Graph, record: &Record) -> Result<NodeId> {
    let award = graph.add(kind::AWARD);
    graph.set_opt(award, "name", record.non_empty("name"));
    graph.set_opt(award, "description", record.non_empty("description"));
    graph.set_opt(award, "uri", record.non_empty("uri"));
    if let Some(raw) = record.non_empty("date") {
        graph.set(award, "date", parse_date("date", raw)?);
    }
    Ok(award)
}

/// A `workrelation` from `work` to a stub work known only by `identifier`.
pub fn format_related_work(graph: &mut Graph, work: NodeId, identifier: &str) -> NodeId {
    let target = graph.add(kind::CREATIVE_WORK);
    let target_identifier = format_work_identifier(graph, target, identifier);
    graph.push(target, "identifiers", target_identifier);

    let relation = graph.add(kind::WORK_RELATION);
    graph.link(relation, "subject", work);
    graph.link(relation, "related", target);
    relation
}

/// Parse a calendar date. Datetimes are accepted and truncated to the date.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(datetime.date());
        }
    }
    Err(SharePushError::InvalidField {
        field: field.to_string(),
        value: raw.to_string(),
        reason: "expected a YYYY-MM-DD date".into(),
    })
}

pub fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SharePushError::InvalidField {
            field: field.to_string(),
            value: raw.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}
