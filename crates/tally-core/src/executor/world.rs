//! Ledger-wide query handlers.

#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]

use rusqlite::ToSql;

use crate::model::{AccountId, AssetId, Hash, Peer, PublicKey, RoleId};
use crate::permission::{Permission, PermissionSet};
use crate::response::{codes, AssetInfo, ErrorKind, QueryResponse, ResponseBody};

use super::rowset::run_gated;
use super::{perm_sql, QueryExecutor};

impl QueryExecutor {
    pub(super) fn get_block(
        &self,
        creator: &AccountId,
        hash: &Hash,
        height: u64,
    ) -> QueryResponse {
        if !self.has_account_role_permission(Permission::GetBlocks, creator.as_str()) {
            return self.permission_denied(&[Permission::GetBlocks], hash);
        }

        let ledger_height = self.block_store.size();
        if height > ledger_height {
            return self.log_and_error(
                ErrorKind::StatefulFailed,
                &format!(
                    "requested height ({height}) is greater than the ledger's one ({ledger_height})"
                ),
                codes::HEIGHT_OUT_OF_RANGE,
                hash,
            );
        }

        match self.block_store.fetch(height) {
            Some(block) => {
                QueryResponse::new(hash.clone(), ResponseBody::Block((*block).clone()))
            }
            None => self.log_and_error(
                ErrorKind::StatefulFailed,
                &format!("could not retrieve block with given height: {height}"),
                codes::INTERNAL,
                hash,
            ),
        }
    }

    pub(super) fn get_roles(&self, creator: &AccountId, hash: &Hash) -> QueryResponse {
        let check = perm_sql::role_permission_check_sql(
            Permission::GetRoles,
            perm_sql::ROLE_ACCOUNT_PARAM,
        );
        let sql = format!(
            "WITH has_perms AS ({check})\n\
             SELECT role_id, perm FROM role\n\
             RIGHT OUTER JOIN has_perms ON TRUE"
        );

        let creator_id = creator.as_str();
        let params: [(&str, &dyn ToSql); 1] = [(":role_account_id", &creator_id)];
        let gated = match run_gated::<_, bool>(&self.conn, &sql, &params, 1, |row| {
            Ok(row.get::<_, Option<String>>(0)?)
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&[Permission::GetRoles], hash);
        }

        let roles: Result<Vec<RoleId>, _> = gated.rows.into_iter().map(RoleId::new).collect();
        match roles {
            Ok(roles) => QueryResponse::new(hash.clone(), ResponseBody::Roles(roles)),
            Err(e) => self.internal_error(e, hash),
        }
    }

    pub(super) fn get_role_permissions(
        &self,
        creator: &AccountId,
        hash: &Hash,
        role_id: &RoleId,
    ) -> QueryResponse {
        let check = perm_sql::role_permission_check_sql(
            Permission::GetRoles,
            perm_sql::ROLE_ACCOUNT_PARAM,
        );
        let sql = format!(
            "WITH has_perms AS ({check}),\n\
             perms AS (\n\
                 SELECT permission FROM role_has_permissions\n\
                 WHERE role_id = :role_name\n\
             )\n\
             SELECT permission, perm FROM perms\n\
             RIGHT OUTER JOIN has_perms ON TRUE"
        );

        let creator_id = creator.as_str();
        let role_name = role_id.as_str();
        let params: [(&str, &dyn ToSql); 2] = [
            (":role_account_id", &creator_id),
            (":role_name", &role_name),
        ];
        let gated = match run_gated::<_, bool>(&self.conn, &sql, &params, 1, |row| {
            Ok(row.get::<_, Option<i64>>(0)?)
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&[Permission::GetRoles], hash);
        }
        let Some(mask) = gated.rows.into_iter().next() else {
            return self.log_and_error(
                ErrorKind::NoRoles,
                &format!("{{{role_id}, {creator}}}"),
                0,
                hash,
            );
        };

        QueryResponse::new(
            hash.clone(),
            ResponseBody::RolePermissions(PermissionSet::from_mask(mask)),
        )
    }

    pub(super) fn get_asset_info(
        &self,
        creator: &AccountId,
        hash: &Hash,
        asset_id: &AssetId,
    ) -> QueryResponse {
        let check = perm_sql::role_permission_check_sql(
            Permission::ReadAssets,
            perm_sql::ROLE_ACCOUNT_PARAM,
        );
        let sql = format!(
            "WITH has_perms AS ({check}),\n\
             perms AS (\n\
                 SELECT domain_id, precision FROM asset\n\
                 WHERE asset_id = :asset_id\n\
             )\n\
             SELECT domain_id, precision, perm FROM perms\n\
             RIGHT OUTER JOIN has_perms ON TRUE"
        );

        let creator_id = creator.as_str();
        let asset_name = asset_id.as_str();
        let params: [(&str, &dyn ToSql); 2] = [
            (":role_account_id", &creator_id),
            (":asset_id", &asset_name),
        ];
        let gated = match run_gated::<_, bool>(&self.conn, &sql, &params, 2, |row| {
            let domain_id: Option<String> = row.get(0)?;
            let precision: Option<i64> = row.get(1)?;
            Ok(match (domain_id, precision) {
                (Some(domain_id), Some(precision)) => Some((domain_id, precision)),
                _ => None,
            })
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&[Permission::ReadAssets], hash);
        }
        let Some((domain_id, precision)) = gated.rows.into_iter().next() else {
            return self.log_and_error(
                ErrorKind::NoAsset,
                &format!("{{{asset_id}, {creator}}}"),
                0,
                hash,
            );
        };

        QueryResponse::new(
            hash.clone(),
            ResponseBody::AssetInfo(AssetInfo {
                asset_id: asset_id.clone(),
                domain_id,
                precision: precision as u32,
            }),
        )
    }

    pub(super) fn get_peers(&self, creator: &AccountId, hash: &Hash) -> QueryResponse {
        let check = perm_sql::role_permission_check_sql(
            Permission::GetPeers,
            perm_sql::ROLE_ACCOUNT_PARAM,
        );
        let sql = format!(
            "WITH has_perms AS ({check})\n\
             SELECT public_key, address, perm FROM peer\n\
             RIGHT OUTER JOIN has_perms ON TRUE"
        );

        let creator_id = creator.as_str();
        let params: [(&str, &dyn ToSql); 1] = [(":role_account_id", &creator_id)];
        let gated = match run_gated::<_, bool>(&self.conn, &sql, &params, 2, |row| {
            let public_key: Option<String> = row.get(0)?;
            let address: Option<String> = row.get(1)?;
            Ok(match (public_key, address) {
                (Some(public_key), Some(address)) => Some((public_key, address)),
                _ => None,
            })
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&[Permission::GetPeers], hash);
        }

        let mut peers = Vec::with_capacity(gated.rows.len());
        for (public_key, address) in gated.rows {
            match PublicKey::from_hex(&public_key) {
                Ok(public_key) => peers.push(Peer {
                    address,
                    public_key,
                }),
                Err(e) => return self.internal_error(e, hash),
            }
        }

        QueryResponse::new(hash.clone(), ResponseBody::Peers(peers))
    }
}
