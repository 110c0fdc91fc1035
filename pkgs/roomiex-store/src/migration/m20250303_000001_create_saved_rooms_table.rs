use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum SavedRooms {
    Table,
    Id,
    UserId,
    RoomId,
    CreatedAt,
}

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20250303_000001_create_saved_rooms_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavedRooms::Table)
                    .col(
                        ColumnDef::new(SavedRooms::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavedRooms::UserId).string().not_null())
                    .col(ColumnDef::new(SavedRooms::RoomId).string().not_null())
                    .col(ColumnDef::new(SavedRooms::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_saved_rooms_user_room")
                    .table(SavedRooms::Table)
                    .col(SavedRooms::UserId)
                    .col(SavedRooms::RoomId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SavedRooms::Table).to_owned())
            .await
    }
}
