use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum RoomListings {
    Table,
    Id,
    UserId,
    Title,
    Description,
    Location,
    Price,
    BillsIncluded,
    RoomType,
    AvailableFrom,
    MinimumStay,
    AmenitiesJson,
    PhotosJson,
    AiScore,
    AiAnalysisJson,
    Status,
    CreatedAt,
    UpdatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250302_000001_create_room_listings_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoomListings::Table)
                    .col(
                        ColumnDef::new(RoomListings::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoomListings::UserId).string().not_null())
                    .col(ColumnDef::new(RoomListings::Title).string().not_null())
                    .col(ColumnDef::new(RoomListings::Description).string())
                    .col(ColumnDef::new(RoomListings::Location).string().not_null())
                    .col(ColumnDef::new(RoomListings::Price).double().not_null())
                    .col(
                        ColumnDef::new(RoomListings::BillsIncluded)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(RoomListings::RoomType).string().not_null())
                    .col(ColumnDef::new(RoomListings::AvailableFrom).string())
                    .col(ColumnDef::new(RoomListings::MinimumStay).string())
                    .col(
                        ColumnDef::new(RoomListings::AmenitiesJson)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(RoomListings::PhotosJson)
                            .string()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(RoomListings::AiScore).double())
                    .col(ColumnDef::new(RoomListings::AiAnalysisJson).string())
                    .col(
                        ColumnDef::new(RoomListings::Status)
                            .string()
                            .not_null()
                            .default("draft"),
                    )
                    .col(
                        ColumnDef::new(RoomListings::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RoomListings::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_room_listings_status")
                    .table(RoomListings::Table)
                    .col(RoomListings::Status)
                    .col(RoomListings::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoomListings::Table).to_owned())
            .await
    }
}
