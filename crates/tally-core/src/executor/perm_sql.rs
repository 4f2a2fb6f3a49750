//! Authorization predicates rendered as SQL fragments.
//!
//! Each gated query plan opens with a `has_perms` common table expression
//! built here. The fragment folds the capability masks of every role the
//! creator holds with the session-registered `bit_or` aggregate, so the
//! database decides data and authorization in one statement.
//!
//! Account ids are embedded as quoted literals. That is safe because an
//! [`AccountId`] only exists if it matched the identifier grammar at
//! construction; the grammar admits no quotes. Domains are compared as
//! literals too, computed in Rust, because the schema stores only the
//! full id.

use crate::model::AccountId;
use crate::permission::{Permission, PermissionSet};

/// Alias bound to the probed account in the single-permission fragment.
pub(crate) const ROLE_ACCOUNT_PARAM: &str = ":role_account_id";

/// Renders a single-permission check as a one-row, one-column select.
///
/// The column `perm` is true when the union of the account's role masks
/// intersects the requested capability or the root capability. The
/// account is referenced through `account_alias`, either a named
/// parameter or a quoted literal.
pub(crate) fn role_permission_check_sql(permission: Permission, account_alias: &str) -> String {
    let mask = PermissionSet::of(permission)
        .union(PermissionSet::of(Permission::Root))
        .as_mask();
    format!(
        "SELECT (COALESCE(bit_or(rp.permission), 0) & {mask}) <> 0 AS perm \
         FROM role_has_permissions AS rp \
         JOIN account_has_roles AS ar ON ar.role_id = rp.role_id \
         WHERE ar.account_id = {account_alias}"
    )
}

fn exact_permission_check_sql(permission: Permission, creator: &AccountId) -> String {
    let mask = PermissionSet::of(permission).as_mask();
    format!(
        "SELECT (COALESCE(bit_or(rp.permission), 0) & {mask}) = {mask} AS perm \
         FROM role_has_permissions AS rp \
         JOIN account_has_roles AS ar ON ar.role_id = rp.role_id \
         WHERE ar.account_id = '{creator}'"
    )
}

/// Renders the four-way authorization predicate for account-scoped
/// queries.
///
/// The resulting select yields exactly one row with a boolean column
/// `perm`, true when any of the following holds for the creator:
///
/// - it has the root capability,
/// - it targets itself and has the individual capability,
/// - it has the global capability,
/// - it shares the target's domain and has the domain capability.
pub(crate) fn query_permission_clause(
    creator: &AccountId,
    target: &AccountId,
    indiv: Permission,
    all: Permission,
    domain: Permission,
) -> String {
    let creator_literal = format!("'{creator}'");
    format!(
        "WITH has_root_perm AS ({root_check}),\n\
         has_indiv_perm AS ({indiv_check}),\n\
         has_all_perm AS ({all_check}),\n\
         has_domain_perm AS ({domain_check})\n\
         SELECT (SELECT perm FROM has_root_perm)\n\
             OR ('{creator}' = '{target}' AND (SELECT perm FROM has_indiv_perm))\n\
             OR (SELECT perm FROM has_all_perm)\n\
             OR ('{creator_domain}' = '{target_domain}' AND (SELECT perm FROM has_domain_perm))\n\
             AS perm",
        root_check = role_permission_check_sql(Permission::Root, &creator_literal),
        indiv_check = exact_permission_check_sql(indiv, creator),
        all_check = exact_permission_check_sql(all, creator),
        domain_check = exact_permission_check_sql(domain, creator),
        creator_domain = creator.domain(),
        target_domain = target.domain(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;
    use rusqlite::Connection;

    fn world() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::init_schema(&conn).unwrap();
        schema::prepare_connection(&conn).unwrap();
        conn
    }

    fn grant(conn: &Connection, account: &str, role: &str, set: PermissionSet) {
        conn.execute("INSERT OR IGNORE INTO role (role_id) VALUES (?1)", [role])
            .unwrap();
        conn.execute(
            "INSERT INTO role_has_permissions (role_id, permission) VALUES (?1, ?2)",
            rusqlite::params![role, set.as_mask()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO account_has_roles (account_id, role_id) VALUES (?1, ?2)",
            rusqlite::params![account, role],
        )
        .unwrap();
    }

    fn eval_clause(conn: &Connection, clause: &str) -> bool {
        conn.query_row(clause, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn single_check_matches_granted_permission() {
        let conn = world();
        grant(
            &conn,
            "alice@test",
            "user",
            PermissionSet::of(Permission::GetRoles),
        );

        let sql = role_permission_check_sql(Permission::GetRoles, ROLE_ACCOUNT_PARAM);
        let granted: bool = conn
            .query_row(&sql, rusqlite::named_params! {":role_account_id": "alice@test"}, |row| {
                row.get(0)
            })
            .unwrap();
        assert!(granted);

        let sql = role_permission_check_sql(Permission::GetPeers, ROLE_ACCOUNT_PARAM);
        let granted: bool = conn
            .query_row(&sql, rusqlite::named_params! {":role_account_id": "alice@test"}, |row| {
                row.get(0)
            })
            .unwrap();
        assert!(!granted);
    }

    #[test]
    fn root_satisfies_any_single_check() {
        let conn = world();
        grant(&conn, "admin@test", "admin", PermissionSet::of(Permission::Root));

        let sql = role_permission_check_sql(Permission::GetPeers, ROLE_ACCOUNT_PARAM);
        let granted: bool = conn
            .query_row(&sql, rusqlite::named_params! {":role_account_id": "admin@test"}, |row| {
                row.get(0)
            })
            .unwrap();
        assert!(granted);
    }

    #[test]
    fn masks_union_across_roles() {
        // Neither role alone carries the capability bit, together they do
        // not either; but a capability split across roles must be found.
        let conn = world();
        grant(&conn, "alice@test", "r1", PermissionSet::of(Permission::GetMyAccount));
        grant(&conn, "alice@test", "r2", PermissionSet::of(Permission::GetRoles));

        let sql = role_permission_check_sql(Permission::GetRoles, ROLE_ACCOUNT_PARAM);
        let granted: bool = conn
            .query_row(&sql, rusqlite::named_params! {":role_account_id": "alice@test"}, |row| {
                row.get(0)
            })
            .unwrap();
        assert!(granted);
    }

    fn clause_for(conn: &Connection, creator: &str, target: &str) -> bool {
        let clause = query_permission_clause(
            &AccountId::new(creator).unwrap(),
            &AccountId::new(target).unwrap(),
            Permission::GetMyAccount,
            Permission::GetAllAccounts,
            Permission::GetDomainAccounts,
        );
        eval_clause(conn, &clause)
    }

    #[test]
    fn individual_permission_only_reaches_self() {
        let conn = world();
        grant(&conn, "alice@test", "user", PermissionSet::of(Permission::GetMyAccount));

        assert!(clause_for(&conn, "alice@test", "alice@test"));
        assert!(!clause_for(&conn, "alice@test", "bob@test"));
    }

    #[test]
    fn domain_permission_stops_at_the_domain_boundary() {
        let conn = world();
        grant(
            &conn,
            "alice@test",
            "observer",
            PermissionSet::of(Permission::GetDomainAccounts),
        );

        assert!(clause_for(&conn, "alice@test", "bob@test"));
        assert!(!clause_for(&conn, "alice@test", "bob@other"));
    }

    #[test]
    fn global_permission_crosses_domains() {
        let conn = world();
        grant(
            &conn,
            "alice@test",
            "auditor",
            PermissionSet::of(Permission::GetAllAccounts),
        );

        assert!(clause_for(&conn, "alice@test", "bob@other"));
    }

    #[test]
    fn root_overrides_everything() {
        let conn = world();
        grant(&conn, "admin@test", "admin", PermissionSet::of(Permission::Root));

        assert!(clause_for(&conn, "admin@test", "bob@other"));
    }

    #[test]
    fn no_roles_means_no_permission() {
        let conn = world();
        assert!(!clause_for(&conn, "ghost@test", "ghost@test"));
    }
}
