//! Account-scoped query handlers.

#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use std::str::FromStr;

use rusqlite::ToSql;
use rust_decimal::Decimal;
use tracing::warn;

use crate::model::{AccountAsset, AccountId, AssetId, DetailRecordId, Hash, PublicKey, RoleId};
use crate::permission::Permission;
use crate::query::{AssetPaginationMeta, DetailPaginationMeta};
use crate::response::{
    codes, AccountDetailPage, AccountAssetsPage, AccountResponse, ErrorKind, QueryResponse,
    ResponseBody,
};

use super::pagination::split_lookahead;
use super::rowset::run_gated;
use super::{perm_sql, QueryExecutor};

/// The empty detail document.
const EMPTY_DETAIL: &str = "{}";

impl QueryExecutor {
    pub(super) fn get_account(
        &self,
        creator: &AccountId,
        hash: &Hash,
        target: &AccountId,
    ) -> QueryResponse {
        const REQUIRED: [Permission; 3] = [
            Permission::GetMyAccount,
            Permission::GetAllAccounts,
            Permission::GetDomainAccounts,
        ];
        let clause = perm_sql::query_permission_clause(
            creator, target, REQUIRED[0], REQUIRED[1], REQUIRED[2],
        );
        let sql = format!(
            "WITH has_perms AS ({clause}),\n\
             t AS (\n\
                 SELECT a.account_id, a.domain_id, a.quorum, a.data,\n\
                        group_concat(ar.role_id ORDER BY ar.role_id) AS roles\n\
                 FROM account AS a\n\
                 JOIN account_has_roles AS ar ON ar.account_id = a.account_id\n\
                 WHERE a.account_id = :target_account_id\n\
                 GROUP BY a.account_id\n\
             )\n\
             SELECT account_id, domain_id, quorum, data, roles, perm\n\
             FROM t RIGHT OUTER JOIN has_perms ON TRUE"
        );

        let target_id = target.as_str();
        let params: [(&str, &dyn ToSql); 1] = [(":target_account_id", &target_id)];
        let gated = match run_gated::<_, bool>(&self.conn, &sql, &params, 5, |row| {
            let account_id: Option<String> = row.get(0)?;
            let domain_id: Option<String> = row.get(1)?;
            let quorum: Option<i64> = row.get(2)?;
            let data: Option<String> = row.get(3)?;
            let roles: Option<String> = row.get(4)?;
            Ok(match (account_id, domain_id, quorum, data, roles) {
                (Some(a), Some(d), Some(q), Some(j), Some(r)) => Some((a, d, q, j, r)),
                _ => None,
            })
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&REQUIRED, hash);
        }
        let Some((account_id, domain_id, quorum, detail, roles_csv)) =
            gated.rows.into_iter().next()
        else {
            return self.log_and_error(ErrorKind::NoAccount, target.as_str(), 0, hash);
        };

        let roles: Result<Vec<RoleId>, _> = roles_csv.split(',').map(RoleId::new).collect();
        let (account_id, roles) = match (AccountId::new(account_id), roles) {
            (Ok(account_id), Ok(roles)) => (account_id, roles),
            (Err(e), _) => return self.internal_error(e, hash),
            (_, Err(e)) => return self.internal_error(e, hash),
        };

        QueryResponse::new(
            hash.clone(),
            ResponseBody::Account(AccountResponse {
                account_id,
                domain_id,
                quorum: quorum as u32,
                detail,
                roles,
            }),
        )
    }

    pub(super) fn get_signatories(
        &self,
        creator: &AccountId,
        hash: &Hash,
        target: &AccountId,
    ) -> QueryResponse {
        const REQUIRED: [Permission; 3] = [
            Permission::GetMySignatories,
            Permission::GetAllSignatories,
            Permission::GetDomainSignatories,
        ];
        let clause = perm_sql::query_permission_clause(
            creator, target, REQUIRED[0], REQUIRED[1], REQUIRED[2],
        );
        let sql = format!(
            "WITH has_perms AS ({clause}),\n\
             t AS (\n\
                 SELECT public_key FROM account_has_signatory\n\
                 WHERE account_id = :account_id\n\
             )\n\
             SELECT public_key, perm FROM t\n\
             RIGHT OUTER JOIN has_perms ON TRUE"
        );

        let target_id = target.as_str();
        let params: [(&str, &dyn ToSql); 1] = [(":account_id", &target_id)];
        let gated = match run_gated::<_, bool>(&self.conn, &sql, &params, 1, |row| {
            Ok(row.get::<_, Option<String>>(0)?)
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&REQUIRED, hash);
        }
        if gated.rows.is_empty() {
            return self.log_and_error(ErrorKind::NoSignatories, target.as_str(), 0, hash);
        }

        let keys: Result<Vec<PublicKey>, _> = gated
            .rows
            .iter()
            .map(|raw| PublicKey::from_hex(raw))
            .collect();
        match keys {
            Ok(keys) => QueryResponse::new(hash.clone(), ResponseBody::Signatories(keys)),
            Err(e) => self.internal_error(e, hash),
        }
    }

    pub(super) fn get_account_assets(
        &self,
        creator: &AccountId,
        hash: &Hash,
        target: &AccountId,
        pagination: &AssetPaginationMeta,
    ) -> QueryResponse {
        const REQUIRED: [Permission; 3] = [
            Permission::GetMyAccountAssets,
            Permission::GetAllAccountAssets,
            Permission::GetDomainAccountAssets,
        ];
        let clause = perm_sql::query_permission_clause(
            creator, target, REQUIRED[0], REQUIRED[1], REQUIRED[2],
        );
        let sql = format!(
            "WITH has_perms AS ({clause}),\n\
             all_data AS (\n\
                 SELECT row_number() OVER (ORDER BY asset_id ASC) AS rn,\n\
                        account_id, asset_id, amount\n\
                 FROM account_has_asset\n\
                 WHERE account_id = :account_id\n\
             ),\n\
             total_number AS (\n\
                 SELECT rn AS total_number FROM all_data ORDER BY rn DESC LIMIT 1\n\
             ),\n\
             page_start AS (\n\
                 SELECT rn FROM all_data\n\
                 WHERE coalesce(asset_id = :first_asset_id, TRUE)\n\
                 ORDER BY rn\n\
                 LIMIT 1\n\
             ),\n\
             page_data AS (\n\
                 SELECT all_data.rn, all_data.account_id, all_data.asset_id,\n\
                        all_data.amount, total_number.total_number\n\
                 FROM all_data, page_start, total_number\n\
                 WHERE all_data.rn >= page_start.rn\n\
                   AND all_data.rn < page_start.rn + :page_size\n\
             )\n\
             SELECT account_id, asset_id, amount, total_number, perm\n\
             FROM page_data\n\
             RIGHT OUTER JOIN has_perms ON TRUE\n\
             ORDER BY page_data.rn"
        );

        let target_id = target.as_str();
        let first_asset_id = pagination.first_asset_id.as_ref().map(AssetId::as_str);
        // One past the page, to learn whether a next page exists.
        let window = pagination.page_size as i64 + 1;
        let params: [(&str, &dyn ToSql); 3] = [
            (":account_id", &target_id),
            (":first_asset_id", &first_asset_id),
            (":page_size", &window),
        ];
        let gated = match run_gated::<_, bool>(&self.conn, &sql, &params, 4, |row| {
            let account_id: Option<String> = row.get(0)?;
            let asset_id: Option<String> = row.get(1)?;
            let amount: Option<String> = row.get(2)?;
            let total: Option<i64> = row.get(3)?;
            Ok(match (account_id, asset_id, amount, total) {
                (Some(a), Some(s), Some(m), Some(t)) => Some((a, s, m, t)),
                _ => None,
            })
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&REQUIRED, hash);
        }

        let total = gated.rows.first().map_or(0, |row| row.3 as u64);
        let mut assets = Vec::with_capacity(gated.rows.len());
        for (account_id, asset_id, amount, _) in gated.rows {
            let decoded = AccountId::new(account_id)
                .map_err(|e| e.to_string())
                .and_then(|account_id| {
                    AssetId::new(asset_id)
                        .map(|asset_id| (account_id, asset_id))
                        .map_err(|e| e.to_string())
                })
                .and_then(|(account_id, asset_id)| {
                    Decimal::from_str(&amount)
                        .map(|amount| AccountAsset {
                            account_id,
                            asset_id,
                            amount,
                        })
                        .map_err(|e| e.to_string())
                });
            match decoded {
                Ok(asset) => assets.push(asset),
                Err(e) => return self.internal_error(e, hash),
            }
        }

        if assets.is_empty() {
            if let Some(first_asset_id) = &pagination.first_asset_id {
                return self.log_and_error(
                    ErrorKind::StatefulFailed,
                    &format!("invalid pagination start asset id: {first_asset_id}"),
                    codes::BAD_CURSOR,
                    hash,
                );
            }
        }

        let (assets, next_asset_id) = split_lookahead(
            assets,
            pagination.page_size as usize,
            |asset| asset.asset_id.clone(),
        );

        QueryResponse::new(
            hash.clone(),
            ResponseBody::AccountAssets(AccountAssetsPage {
                assets,
                total,
                next_asset_id,
            }),
        )
    }

    #[allow(clippy::too_many_lines)]
    pub(super) fn get_account_detail(
        &self,
        creator: &AccountId,
        hash: &Hash,
        target: &AccountId,
        writer: Option<&AccountId>,
        key: Option<&str>,
        pagination: Option<&DetailPaginationMeta>,
    ) -> QueryResponse {
        const REQUIRED: [Permission; 3] = [
            Permission::GetMyAccountDetail,
            Permission::GetAllAccountDetail,
            Permission::GetDomainAccountDetail,
        ];
        let clause = perm_sql::query_permission_clause(
            creator, target, REQUIRED[0], REQUIRED[1], REQUIRED[2],
        );
        // Account detail is a writer -> key -> value JSON document; the
        // two json_each calls flatten it into one row per record.
        let sql = format!(
            "WITH has_perms AS ({clause}),\n\
             filtered_plain_data AS (\n\
                 SELECT row_number() OVER (ORDER BY w.key ASC, kv.key ASC) AS rn,\n\
                        w.key AS writer, kv.key AS key, kv.value AS value\n\
                 FROM account AS a, json_each(a.data) AS w, json_each(w.value) AS kv\n\
                 WHERE a.account_id = :account_id\n\
                   AND coalesce(w.key = :writer, TRUE)\n\
                   AND coalesce(kv.key = :key, TRUE)\n\
             ),\n\
             page_limits AS (\n\
                 SELECT first_record.rn AS page_start,\n\
                        first_record.rn + :page_size AS page_end\n\
                 FROM (\n\
                     SELECT rn FROM filtered_plain_data\n\
                     WHERE coalesce(writer = :first_record_writer, TRUE)\n\
                       AND coalesce(key = :first_record_key, TRUE)\n\
                     ORDER BY rn\n\
                     LIMIT 1\n\
                 ) AS first_record\n\
             ),\n\
             total_number AS (\n\
                 SELECT count(*) AS total_number FROM filtered_plain_data\n\
             ),\n\
             next_record AS (\n\
                 SELECT writer, key\n\
                 FROM filtered_plain_data, page_limits\n\
                 WHERE rn = page_limits.page_end\n\
             ),\n\
             page AS (\n\
                 SELECT nullif(json_group_object(writer, json(data_by_writer)), '{{}}') AS json\n\
                 FROM (\n\
                     SELECT fpd.writer AS writer,\n\
                            json_group_object(fpd.key, fpd.value) AS data_by_writer\n\
                     FROM filtered_plain_data AS fpd, page_limits\n\
                     WHERE fpd.rn >= page_limits.page_start\n\
                       AND coalesce(fpd.rn < page_limits.page_end, TRUE)\n\
                     GROUP BY fpd.writer\n\
                 ) AS grouped\n\
             ),\n\
             target_account_exists AS (\n\
                 SELECT count(*) AS val FROM account WHERE account_id = :account_id\n\
             ),\n\
             detail AS (\n\
                 SELECT page.json AS json,\n\
                        total_number.total_number AS total_number,\n\
                        next_record.writer AS next_writer,\n\
                        next_record.key AS next_key,\n\
                        target_account_exists.val AS target_account_exists\n\
                 FROM page\n\
                 LEFT JOIN total_number ON TRUE\n\
                 LEFT JOIN next_record ON TRUE\n\
                 RIGHT JOIN target_account_exists ON TRUE\n\
             )\n\
             SELECT detail.*, perm FROM detail\n\
             RIGHT OUTER JOIN has_perms ON TRUE"
        );

        let target_id = target.as_str();
        let writer_filter = writer.map(AccountId::as_str);
        let first_record = pagination.and_then(|p| p.first_record.as_ref());
        let first_record_writer = first_record.map(|r| r.writer.as_str());
        let first_record_key = first_record.map(|r| r.key.as_str());
        let page_size = pagination.map(|p| p.page_size as i64);
        let params: [(&str, &dyn ToSql); 6] = [
            (":account_id", &target_id),
            (":writer", &writer_filter),
            (":key", &key),
            (":first_record_writer", &first_record_writer),
            (":first_record_key", &first_record_key),
            (":page_size", &page_size),
        ];

        type DetailRow = (
            Option<String>,
            Option<i64>,
            Option<String>,
            Option<String>,
            Option<i64>,
        );
        let gated = match run_gated::<DetailRow, bool>(&self.conn, &sql, &params, 5, |row| {
            Ok(Some((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
            )))
        }) {
            Ok(gated) => gated,
            Err(e) => return self.internal_error(e, hash),
        };

        if !gated.perms {
            return self.permission_denied(&REQUIRED, hash);
        }
        let Some((json, total_number, next_writer, next_key, account_exists)) =
            gated.rows.into_iter().next()
        else {
            return self.log_and_error(ErrorKind::NoAccountDetail, target.as_str(), 0, hash);
        };

        if account_exists.unwrap_or(0) == 0 {
            return self.log_and_error(ErrorKind::NoAccountDetail, target.as_str(), 0, hash);
        }

        let total = total_number.unwrap_or(0).max(0) as u64;
        if let Some(detail) = json {
            let next_record = match (next_writer, next_key) {
                (Some(writer), Some(key)) => match AccountId::new(writer) {
                    Ok(writer) => Some(DetailRecordId { writer, key }),
                    Err(e) => {
                        warn!("next detail record writer is not an account id: {e}");
                        None
                    }
                },
                _ => None,
            };
            return QueryResponse::new(
                hash.clone(),
                ResponseBody::AccountDetail(AccountDetailPage {
                    detail,
                    total,
                    next_record,
                }),
            );
        }

        if total > 0 {
            // A populated window can only decode to NULL when the start
            // record did not resolve.
            let cursor = first_record.map_or_else(
                || "<none>".to_string(),
                |r| format!("{}, {}", r.writer, r.key),
            );
            return self.log_and_error(
                ErrorKind::StatefulFailed,
                &format!("invalid pagination start record: {cursor}"),
                codes::BAD_CURSOR,
                hash,
            );
        }

        QueryResponse::new(
            hash.clone(),
            ResponseBody::AccountDetail(AccountDetailPage {
                detail: EMPTY_DETAIL.to_string(),
                total: 0,
                next_record: None,
            }),
        )
    }
}
