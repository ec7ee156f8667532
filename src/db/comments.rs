use rusqlite::{params, Connection, Row};

use super::models::Comment;

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        body: row.get(4)?,
        created: row.get(5)?,
        active: row.get(6)?,
    })
}

/// Oldest first.
pub fn active_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<Comment>> {
    let mut stmt = conn.prepare(
        "SELECT id, post_id, name, email, body, created, active
         FROM comments
         WHERE post_id = ?1 AND active = 1
         ORDER BY created ASC, id ASC",
    )?;
    let comments = stmt
        .query_map(params![post_id], comment_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(comments)
}

/// New comments start active.
pub fn insert_comment(
    conn: &Connection,
    post_id: i64,
    name: &str,
    email: &str,
    body: &str,
) -> rusqlite::Result<Comment> {
    conn.execute(
        "INSERT INTO comments (post_id, name, email, body) VALUES (?1, ?2, ?3, ?4)",
        params![post_id, name, email, body],
    )?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        "SELECT id, post_id, name, email, body, created, active FROM comments WHERE id = ?1",
        params![id],
        comment_from_row,
    )
}
