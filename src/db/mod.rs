use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite};

use crate::models::*;

/// Adds `column = ?` to an `UPDATE ... SET` list for every field the patch
/// carries. Evaluates to whether anything was added.
macro_rules! push_present {
    ($set:expr, $patch:expr; $($field:ident),+ $(,)?) => {{
        let mut any = false;
        $(
            if let Some(value) = &$patch.$field {
                $set.push(concat!(stringify!($field), " = "))
                    .push_bind_unseparated(value.clone());
                any = true;
            }
        )+
        any
    }};
}

/// Open the SQLite pool, creating the database file when it does not exist.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Create every table and index that does not exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let statements = [
        r#"CREATE TABLE IF NOT EXISTS players (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               espn_id INTEGER NOT NULL,
               name TEXT NOT NULL,
               position TEXT,
               team TEXT,
               age INTEGER,
               avg REAL,
               hr INTEGER,
               rbi INTEGER,
               sb INTEGER,
               ops REAL,
               projected_avg REAL,
               projected_hr INTEGER,
               projected_rbi INTEGER,
               projected_sb INTEGER,
               projected_ops REAL,
               adp REAL,
               adp_trend TEXT,
               ownership REAL,
               created_at TEXT NOT NULL,
               updated_at TEXT
           )"#,
        r#"CREATE UNIQUE INDEX IF NOT EXISTS ix_players_espn_id ON players (espn_id)"#,
        r#"CREATE TABLE IF NOT EXISTS player_cards (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               player_id INTEGER NOT NULL REFERENCES players (id) ON DELETE CASCADE,
               notes TEXT,
               tags TEXT NOT NULL DEFAULT '[]',
               rating INTEGER CHECK (rating BETWEEN 1 AND 10),
               scout_name TEXT,
               created_at TEXT NOT NULL,
               updated_at TEXT
           )"#,
        r#"CREATE INDEX IF NOT EXISTS ix_player_cards_player_id ON player_cards (player_id)"#,
        r#"CREATE TABLE IF NOT EXISTS teams (
               id INTEGER PRIMARY KEY AUTOINCREMENT,
               espn_league_id INTEGER NOT NULL,
               espn_team_id INTEGER NOT NULL,
               name TEXT NOT NULL,
               owner TEXT,
               league_name TEXT,
               league_type TEXT,
               num_teams INTEGER,
               created_at TEXT NOT NULL,
               updated_at TEXT
           )"#,
        r#"CREATE INDEX IF NOT EXISTS ix_teams_espn_league_id ON teams (espn_league_id)"#,
        r#"CREATE INDEX IF NOT EXISTS ix_teams_espn_team_id ON teams (espn_team_id)"#,
    ];

    let mut tx = pool.begin().await?;
    for statement in statements {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Database tables created successfully.");
    Ok(())
}

/// Close the pool, waiting for checked-out connections to come back.
pub async fn close(pool: &SqlitePool) {
    pool.close().await;
    tracing::info!("Database connection closed.");
}

pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

// Player queries
pub async fn list_players(pool: &SqlitePool, params: &ListPlayersQuery) -> Result<Vec<Player>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM players WHERE 1 = 1");

    if let Some(position) = &params.position {
        query.push(" AND position = ").push_bind(position);
    }
    if let Some(team) = &params.team {
        query.push(" AND team = ").push_bind(team);
    }
    if let Some(search) = &params.search {
        // LIKE is case-insensitive for ASCII in SQLite
        let pattern = format!("%{}%", search);
        query
            .push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR team LIKE ")
            .push_bind(pattern)
            .push(")");
    }

    query
        .push(" ORDER BY id LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.skip);

    query.build_query_as::<Player>().fetch_all(pool).await
}

pub async fn get_player_by_id(pool: &SqlitePool, player_id: i64) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>(
        r#"SELECT * FROM players WHERE id = ?"#
    )
    .bind(player_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_player_by_espn_id(pool: &SqlitePool, espn_id: i64) -> Result<Option<Player>, sqlx::Error> {
    sqlx::query_as::<_, Player>(
        r#"SELECT * FROM players WHERE espn_id = ?"#
    )
    .bind(espn_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_player(pool: &SqlitePool, player: &NewPlayer) -> Result<Player, sqlx::Error> {
    sqlx::query_as::<_, Player>(
        r#"INSERT INTO players (
               espn_id, name, position, team, age,
               avg, hr, rbi, sb, ops,
               projected_avg, projected_hr, projected_rbi, projected_sb, projected_ops,
               adp, adp_trend, ownership, created_at
           )
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING *"#
    )
    .bind(player.espn_id)
    .bind(&player.name)
    .bind(&player.position)
    .bind(&player.team)
    .bind(player.age)
    .bind(player.avg)
    .bind(player.hr)
    .bind(player.rbi)
    .bind(player.sb)
    .bind(player.ops)
    .bind(player.projected_avg)
    .bind(player.projected_hr)
    .bind(player.projected_rbi)
    .bind(player.projected_sb)
    .bind(player.projected_ops)
    .bind(player.adp)
    .bind(player.adp_trend)
    .bind(player.ownership)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

/// Write only the columns present in `patch` and stamp `updated_at`.
///
/// An empty patch writes nothing and returns the stored row. `None` when no
/// player has that id.
pub async fn update_player(
    pool: &SqlitePool,
    player_id: i64,
    patch: &PlayerPatch,
) -> Result<Option<Player>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE players SET ");
    let mut set = query.separated(", ");
    let changed = push_present!(set, patch;
        espn_id, name, position, team, age,
        avg, hr, rbi, sb, ops,
        projected_avg, projected_hr, projected_rbi, projected_sb, projected_ops,
        adp, adp_trend, ownership,
    );
    if !changed {
        return get_player_by_id(pool, player_id).await;
    }
    set.push("updated_at = ").push_bind_unseparated(Utc::now());

    query
        .push(" WHERE id = ")
        .push_bind(player_id)
        .push(" RETURNING *");

    query.build_query_as::<Player>().fetch_optional(pool).await
}

/// Returns `false` when no row had that id.
pub async fn delete_player(pool: &SqlitePool, player_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM players WHERE id = ?"#)
        .bind(player_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Players ordered by `stat` descending; rows without a value sort last.
pub async fn get_leaders(pool: &SqlitePool, stat: LeaderStat, limit: i64) -> Result<Vec<Player>, sqlx::Error> {
    // The column name comes from a closed enum, never from the request.
    let sql = format!(
        "SELECT * FROM players ORDER BY {col} IS NULL, {col} DESC, id LIMIT ?",
        col = stat.column()
    );

    sqlx::query_as::<_, Player>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Insert players that are new and refresh identity fields of ones already stored.
///
/// Returns `(created, updated)`.
pub async fn upsert_roster_players(
    pool: &SqlitePool,
    players: &[crate::services::espn::RosterPlayer],
) -> Result<(usize, usize), sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut created = 0;
    let mut updated = 0;
    let now = Utc::now();

    for player in players {
        let existing: Option<i64> = sqlx::query_scalar(
            r#"SELECT id FROM players WHERE espn_id = ?"#
        )
        .bind(player.espn_id)
        .fetch_optional(&mut *tx)
        .await?;

        match existing {
            Some(id) => {
                sqlx::query(
                    r#"UPDATE players
                       SET name = ?, position = ?, team = ?, age = COALESCE(?, age), updated_at = ?
                       WHERE id = ?"#
                )
                .bind(&player.name)
                .bind(&player.position)
                .bind(&player.team)
                .bind(player.age)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                updated += 1;
            }
            None => {
                sqlx::query(
                    r#"INSERT INTO players (espn_id, name, position, team, age, created_at)
                       VALUES (?, ?, ?, ?, ?, ?)"#
                )
                .bind(player.espn_id)
                .bind(&player.name)
                .bind(&player.position)
                .bind(&player.team)
                .bind(player.age)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                created += 1;
            }
        }
    }

    tx.commit().await?;
    Ok((created, updated))
}

// Player card queries
pub async fn get_cards_for_player(pool: &SqlitePool, player_id: i64) -> Result<Vec<PlayerCard>, sqlx::Error> {
    sqlx::query_as::<_, PlayerCard>(
        r#"SELECT * FROM player_cards WHERE player_id = ? ORDER BY id"#
    )
    .bind(player_id)
    .fetch_all(pool)
    .await
}

pub async fn get_card_by_id(pool: &SqlitePool, card_id: i64) -> Result<Option<PlayerCard>, sqlx::Error> {
    sqlx::query_as::<_, PlayerCard>(
        r#"SELECT * FROM player_cards WHERE id = ?"#
    )
    .bind(card_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_card(pool: &SqlitePool, player_id: i64, card: &NewPlayerCard) -> Result<PlayerCard, sqlx::Error> {
    sqlx::query_as::<_, PlayerCard>(
        r#"INSERT INTO player_cards (player_id, notes, tags, rating, scout_name, created_at)
           VALUES (?, ?, ?, ?, ?, ?)
           RETURNING *"#
    )
    .bind(player_id)
    .bind(&card.notes)
    .bind(Json(&card.tags))
    .bind(card.rating)
    .bind(&card.scout_name)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn update_card(
    pool: &SqlitePool,
    card_id: i64,
    patch: &PlayerCardPatch,
) -> Result<Option<PlayerCard>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE player_cards SET ");
    let mut set = query.separated(", ");
    let mut changed = push_present!(set, patch; notes, rating, scout_name);
    if let Some(tags) = &patch.tags {
        set.push("tags = ").push_bind_unseparated(Json(tags.clone()));
        changed = true;
    }
    if !changed {
        return get_card_by_id(pool, card_id).await;
    }
    set.push("updated_at = ").push_bind_unseparated(Utc::now());

    query
        .push(" WHERE id = ")
        .push_bind(card_id)
        .push(" RETURNING *");

    query.build_query_as::<PlayerCard>().fetch_optional(pool).await
}

pub async fn delete_card(pool: &SqlitePool, card_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM player_cards WHERE id = ?"#)
        .bind(card_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// Team queries
pub async fn list_teams(pool: &SqlitePool, params: &ListTeamsQuery) -> Result<Vec<Team>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM teams");

    if let Some(league_type) = params.league_type {
        query.push(" WHERE league_type = ").push_bind(league_type);
    }

    query
        .push(" ORDER BY id LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.skip);

    query.build_query_as::<Team>().fetch_all(pool).await
}

pub async fn get_team_by_id(pool: &SqlitePool, team_id: i64) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        r#"SELECT * FROM teams WHERE id = ?"#
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert_team(pool: &SqlitePool, team: &NewTeam) -> Result<Team, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        r#"INSERT INTO teams (
               espn_league_id, espn_team_id, name, owner,
               league_name, league_type, num_teams, created_at
           )
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING *"#
    )
    .bind(team.espn_league_id)
    .bind(team.espn_team_id)
    .bind(&team.name)
    .bind(&team.owner)
    .bind(&team.league_name)
    .bind(team.league_type)
    .bind(team.num_teams)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn update_team(
    pool: &SqlitePool,
    team_id: i64,
    patch: &TeamPatch,
) -> Result<Option<Team>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE teams SET ");
    let mut set = query.separated(", ");
    let changed = push_present!(set, patch;
        espn_league_id, espn_team_id, name, owner, league_name, league_type, num_teams,
    );
    if !changed {
        return get_team_by_id(pool, team_id).await;
    }
    set.push("updated_at = ").push_bind_unseparated(Utc::now());

    query
        .push(" WHERE id = ")
        .push_bind(team_id)
        .push(" RETURNING *");

    query.build_query_as::<Team>().fetch_optional(pool).await
}

pub async fn delete_team(pool: &SqlitePool, team_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(r#"DELETE FROM teams WHERE id = ?"#)
        .bind(team_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
