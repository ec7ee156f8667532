//! Post and tag queries.
//!
//! Every read that can reach a visitor binds `PostStatus::Published`
//! explicitly.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use super::models::{slugify, NewPost, Post, PostStatus, SearchHit, Tag};
use crate::search::SearchStrategy;

pub const SIMILAR_POSTS_LIMIT: u64 = 4;

const POST_COLUMNS: &str = "p.id, p.title, p.slug, p.author, p.body, p.publish, p.status";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        author: row.get(3)?,
        body: row.get(4)?,
        publish: row.get(5)?,
        status: row.get(6)?,
        tags: Vec::new(),
    })
}

fn with_tags(conn: &Connection, mut posts: Vec<Post>) -> rusqlite::Result<Vec<Post>> {
    for post in &mut posts {
        post.tags = tags_for_post(conn, post.id)?;
    }
    Ok(posts)
}

pub fn tags_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<Tag>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.slug
         FROM tags t
         JOIN post_tags pt ON pt.tag_id = t.id
         WHERE pt.post_id = ?1
         ORDER BY t.name",
    )?;
    let tags = stmt
        .query_map(params![post_id], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tags)
}

pub fn find_tag_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Tag> {
    conn.query_row(
        "SELECT id, name, slug FROM tags WHERE slug = ?1",
        params![slug],
        |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                slug: row.get(2)?,
            })
        },
    )
}

pub fn count_published(conn: &Connection, tag: Option<&Tag>) -> rusqlite::Result<u64> {
    let count: i64 = match tag {
        Some(tag) => conn.query_row(
            "SELECT COUNT(*) FROM posts p
             JOIN post_tags pt ON pt.post_id = p.id
             WHERE p.status = ?1 AND pt.tag_id = ?2",
            params![PostStatus::Published, tag.id],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM posts p WHERE p.status = ?1",
            params![PostStatus::Published],
            |row| row.get(0),
        )?,
    };
    Ok(count as u64)
}

/// Newest first.
pub fn list_published(
    conn: &Connection,
    tag: Option<&Tag>,
    limit: u64,
    offset: u64,
) -> rusqlite::Result<Vec<Post>> {
    let posts = match tag {
        Some(tag) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts p
                 JOIN post_tags pt ON pt.post_id = p.id
                 WHERE p.status = ?1 AND pt.tag_id = ?2
                 ORDER BY p.publish DESC, p.id DESC
                 LIMIT ?3 OFFSET ?4"
            ))?;
            let rows = stmt.query_map(
                params![PostStatus::Published, tag.id, limit as i64, offset as i64],
                post_from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM posts p
                 WHERE p.status = ?1
                 ORDER BY p.publish DESC, p.id DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt.query_map(
                params![PostStatus::Published, limit as i64, offset as i64],
                post_from_row,
            )?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    with_tags(conn, posts)
}

/// Published post whose publish date (UTC) and slug both match.
pub fn find_published_by_date(
    conn: &Connection,
    date: NaiveDate,
    slug: &str,
) -> rusqlite::Result<Post> {
    let mut post = conn.query_row(
        &format!(
            "SELECT {POST_COLUMNS} FROM posts p
             WHERE p.status = ?1 AND p.slug = ?2 AND date(p.publish) = ?3"
        ),
        params![
            PostStatus::Published,
            slug,
            date.format("%Y-%m-%d").to_string()
        ],
        post_from_row,
    )?;
    post.tags = tags_for_post(conn, post.id)?;
    Ok(post)
}

pub fn find_published_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Post> {
    let mut post = conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.status = ?1 AND p.id = ?2"),
        params![PostStatus::Published, id],
        post_from_row,
    )?;
    post.tags = tags_for_post(conn, post.id)?;
    Ok(post)
}

/// Published posts sharing at least one tag with `post_id`, most shared
/// tags first, then newest, then highest id.
pub fn similar_posts(conn: &Connection, post_id: i64, limit: u64) -> rusqlite::Result<Vec<Post>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS}, COUNT(pt.tag_id) AS shared_tags
         FROM posts p
         JOIN post_tags pt ON pt.post_id = p.id
         WHERE p.status = ?1
           AND p.id != ?2
           AND pt.tag_id IN (SELECT tag_id FROM post_tags WHERE post_id = ?2)
         GROUP BY p.id
         ORDER BY shared_tags DESC, p.publish DESC, p.id DESC
         LIMIT ?3"
    ))?;
    let posts = stmt
        .query_map(
            params![PostStatus::Published, post_id, limit as i64],
            post_from_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    with_tags(conn, posts)
}

/// Ranked search over published posts. Callers must not pass an empty query.
pub fn search_published(
    conn: &Connection,
    strategy: SearchStrategy,
    query: &str,
    threshold: f64,
) -> rusqlite::Result<Vec<SearchHit>> {
    let (score_expr, cutoff) = match strategy {
        SearchStrategy::Trigram => ("trigram_similarity(p.title, ?2)", "score > ?3"),
        SearchStrategy::Weighted => ("weighted_rank(p.title, p.body, ?2)", "score >= ?3"),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM (
             SELECT {POST_COLUMNS}, {score_expr} AS score
             FROM posts p
             WHERE p.status = ?1
         )
         WHERE {cutoff}
         ORDER BY score DESC, publish DESC, id DESC"
    ))?;
    let hits = stmt
        .query_map(params![PostStatus::Published, query, threshold], |row| {
            Ok(SearchHit {
                post: post_from_row(row)?,
                score: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut with_tags = Vec::with_capacity(hits.len());
    for mut hit in hits {
        hit.post.tags = tags_for_post(conn, hit.post.id)?;
        with_tags.push(hit);
    }
    Ok(with_tags)
}

#[derive(Debug, thiserror::Error)]
#[error("tag {0:?} has no characters usable in a slug")]
pub struct EmptyTagSlug(pub String);

/// Returns the tag with `name`'s slug, creating it if needed. Names that
/// slugify to nothing are rejected rather than merged under an empty slug.
pub fn ensure_tag(conn: &Connection, name: &str) -> rusqlite::Result<Tag> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(rusqlite::Error::ToSqlConversionFailure(Box::new(
            EmptyTagSlug(name.to_string()),
        )));
    }
    conn.execute(
        "INSERT OR IGNORE INTO tags (name, slug) VALUES (?1, ?2)",
        params![name.trim(), slug],
    )?;
    find_tag_by_slug(conn, &slug)
}

pub fn insert_post(conn: &Connection, post: &NewPost) -> rusqlite::Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO posts (title, slug, author, body, publish, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            post.title,
            post.slug,
            post.author,
            post.body,
            post.publish,
            post.status
        ],
    )?;
    let id = tx.last_insert_rowid();
    for name in &post.tags {
        let tag = ensure_tag(&tx, name)?;
        tx.execute(
            "INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)",
            params![id, tag.id],
        )?;
    }
    tx.commit()?;
    Ok(id)
}
