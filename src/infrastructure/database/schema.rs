// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::entities::{cliente, servico};
use sea_orm::sea_query::{Index, IndexCreateStatement, TableCreateStatement};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, Schema};
use tracing::info;

/// 创建两张快照表及其索引，已存在时跳过
///
/// 唯一约束保证同一客户在同一提取时刻只有一条记录。
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();

    for table in tables(&Schema::new(backend)) {
        db.execute(backend.build(&table)).await?;
    }

    for index in indexes() {
        db.execute(backend.build(&index)).await?;
    }

    info!("Database schema is ready");
    Ok(())
}

fn tables(schema: &Schema) -> Vec<TableCreateStatement> {
    let mut clientes = schema.create_table_from_entity(cliente::Entity);
    clientes.if_not_exists().index(
        Index::create()
            .name("uq_clientes_snapshot")
            .col(cliente::Column::ClientId)
            .col(cliente::Column::ExtractionDate)
            .unique(),
    );

    let mut servicos = schema.create_table_from_entity(servico::Entity);
    servicos.if_not_exists().index(
        Index::create()
            .name("uq_servicos_snapshot")
            .col(servico::Column::ClientId)
            .col(servico::Column::ServiceDate)
            .col(servico::Column::ServiceType)
            .col(servico::Column::ExtractionDate)
            .unique(),
    );

    vec![clientes, servicos]
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .if_not_exists()
            .name("idx_clientes_client_id")
            .table(cliente::Entity)
            .col(cliente::Column::ClientId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_servicos_client_id")
            .table(servico::Entity)
            .col(servico::Column::ClientId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_servicos_service_date")
            .table(servico::Entity)
            .col(servico::Column::ServiceDate)
            .to_owned(),
    ]
}
